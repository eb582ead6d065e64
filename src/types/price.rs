use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit price of a cryptocurrency. Always positive once inside the catalog;
/// `Catalog::set_price` enforces that at the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: impl Into<Decimal>) -> Self {
        Price(value.into())
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
