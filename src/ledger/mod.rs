use crate::error::{Error, Result};
use crate::interfaces::ledger_store::LedgerStore;
use crate::types::balance::Balance;
use crate::types::ids::{CryptoId, TxId, UserId};
use crate::types::price::Price;
use crate::types::quantity::Quantity;
use crate::types::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// One executed trade. Immutable once appended; the ledger never updates or
/// deletes a record, so the fold over these is the sole source of truth for
/// holdings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxRecord {
    /// Assigned by the ledger on append; zero until then.
    pub tx_id: TxId,
    pub user_id: UserId,
    pub crypto_id: CryptoId,
    pub side: Side,
    pub quantity: Quantity,
    /// Unit price at execution time, the same snapshot the validation used.
    pub price: Price,
    /// quantity * price, exact.
    pub total: Balance,
    pub created_at: Timestamp,
}

impl TxRecord {
    pub fn new(
        user_id: UserId,
        crypto_id: CryptoId,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        TxRecord {
            tx_id: TxId(0),
            user_id,
            crypto_id,
            side,
            quantity,
            price,
            total: quantity * price,
            created_at: Timestamp::now(),
        }
    }

    /// Contribution of this record to the holding of (user, crypto).
    pub fn signed_quantity(&self) -> Quantity {
        match self.side {
            Side::Buy => self.quantity,
            Side::Sell => Quantity::zero() - self.quantity,
        }
    }

    /// Contribution of this record to the user's cash balance.
    pub fn signed_cash_flow(&self) -> Balance {
        match self.side {
            Side::Buy => -self.total,
            Side::Sell => self.total,
        }
    }
}

/// In-memory append-only transaction log. Record ids are assigned under the
/// write lock, so id order equals insertion order.
pub struct Ledger {
    records: RwLock<Vec<TxRecord>>,
    next_id: AtomicU64,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

// A poisoned lock means a writer panicked mid-operation; surface it as a
// storage fault instead of propagating the panic to every later caller.
fn poisoned(what: &str) -> Error {
    Error::StorageFailure(format!("ledger lock poisoned during {}", what))
}

impl LedgerStore for Ledger {
    fn append(&self, record: TxRecord) -> Result<TxId> {
        let mut records = self.records.write().map_err(|_| poisoned("append"))?;
        let tx_id = TxId(self.next_id.fetch_add(1, Ordering::SeqCst));

        let mut record = record;
        record.tx_id = tx_id;
        records.push(record);

        Ok(tx_id)
    }

    fn holding_of(&self, user_id: UserId, crypto_id: CryptoId) -> Result<Quantity> {
        let records = self.records.read().map_err(|_| poisoned("holding_of"))?;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && r.crypto_id == crypto_id)
            .map(|r| r.signed_quantity())
            .sum())
    }

    fn entries_for_user(&self, user_id: UserId) -> Result<Vec<TxRecord>> {
        let records = self.records.read().map_err(|_| poisoned("entries_for_user"))?;
        let mut matching: Vec<TxRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        matching.reverse(); // insertion order -> newest first
        Ok(matching)
    }

    fn cryptos_for_user(&self, user_id: UserId) -> Result<Vec<CryptoId>> {
        let records = self.records.read().map_err(|_| poisoned("cryptos_for_user"))?;
        let mut seen = Vec::new();
        for record in records.iter().filter(|r| r.user_id == user_id) {
            if !seen.contains(&record.crypto_id) {
                seen.push(record.crypto_id);
            }
        }
        Ok(seen)
    }

    fn net_cash_flow(&self, user_id: UserId) -> Result<Balance> {
        let records = self.records.read().map_err(|_| poisoned("net_cash_flow"))?;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.signed_cash_flow())
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(user: UserId, crypto: CryptoId, side: Side, qty: i64, price: i64) -> TxRecord {
        TxRecord::new(
            user,
            crypto,
            side,
            Quantity::new(Decimal::from(qty)),
            Price::new(Decimal::from(price)),
        )
    }

    #[test]
    fn ids_are_monotonic_in_append_order() {
        let ledger = Ledger::new();
        let user = UserId::new();
        let crypto = CryptoId::new();

        let a = ledger.append(record(user, crypto, Side::Buy, 1, 100)).unwrap();
        let b = ledger.append(record(user, crypto, Side::Buy, 2, 100)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn holding_folds_buys_minus_sells() {
        let ledger = Ledger::new();
        let user = UserId::new();
        let crypto = CryptoId::new();

        ledger.append(record(user, crypto, Side::Buy, 5, 100)).unwrap();
        ledger.append(record(user, crypto, Side::Sell, 2, 110)).unwrap();

        assert_eq!(
            ledger.holding_of(user, crypto).unwrap(),
            Quantity::new(Decimal::from(3))
        );
    }

    #[test]
    fn holding_is_zero_for_unknown_pair() {
        let ledger = Ledger::new();
        assert_eq!(
            ledger.holding_of(UserId::new(), CryptoId::new()).unwrap(),
            Quantity::zero()
        );
    }

    #[test]
    fn entries_come_back_newest_first() {
        let ledger = Ledger::new();
        let user = UserId::new();
        let crypto = CryptoId::new();

        let first = ledger.append(record(user, crypto, Side::Buy, 1, 100)).unwrap();
        let second = ledger.append(record(user, crypto, Side::Sell, 1, 120)).unwrap();

        let entries = ledger.entries_for_user(user).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tx_id, second);
        assert_eq!(entries[1].tx_id, first);
    }

    #[test]
    fn entries_only_cover_the_requested_user() {
        let ledger = Ledger::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let crypto = CryptoId::new();

        ledger.append(record(alice, crypto, Side::Buy, 1, 100)).unwrap();
        ledger.append(record(bob, crypto, Side::Buy, 7, 100)).unwrap();

        let entries = ledger.entries_for_user(alice).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, alice);
    }

    #[test]
    fn net_cash_flow_is_sells_minus_buys() {
        let ledger = Ledger::new();
        let user = UserId::new();
        let crypto = CryptoId::new();

        ledger.append(record(user, crypto, Side::Buy, 2, 100)).unwrap(); // -200
        ledger.append(record(user, crypto, Side::Sell, 1, 150)).unwrap(); // +150

        assert_eq!(
            ledger.net_cash_flow(user).unwrap(),
            Balance::new(Decimal::from(-50))
        );
    }
}
