use crate::types::balance::Balance;
use crate::types::price::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// Quantity of a cryptocurrency. Trade requests must carry a strictly
/// positive quantity; a derived holding may be zero but never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
    pub fn new(value: impl Into<Decimal>) -> Self {
        Quantity(value.into())
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Quantity(Decimal::ZERO)
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl Add for Quantity {
    type Output = Quantity;
    fn add(self, other: Quantity) -> Quantity {
        Quantity(self.0 + other.0)
    }
}

impl Sub for Quantity {
    type Output = Quantity;
    fn sub(self, other: Quantity) -> Quantity {
        Quantity(self.0 - other.0)
    }
}

impl Mul<Price> for Quantity {
    type Output = Balance;
    fn mul(self, price: Price) -> Balance {
        Balance::new(self.0 * price.as_decimal())
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, x| acc + x)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_times_price_is_exact() {
        // 0.1 + 0.2 style drift must not appear in totals
        let qty = Quantity::new(Decimal::new(3, 1)); // 0.3
        let price = Decimal::new(1001, 1); // 100.1
        let total = qty * Price::new(price);
        assert_eq!(total.as_decimal(), Decimal::new(3003, 2)); // 30.03
    }

    #[test]
    fn holding_fold_sums_to_zero() {
        let qtys = [
            Quantity::new(Decimal::new(5, 1)),
            Quantity::new(Decimal::new(-5, 1)),
        ];
        let net: Quantity = qtys.into_iter().sum();
        assert_eq!(net, Quantity::zero());
    }
}
