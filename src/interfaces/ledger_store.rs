use crate::error::Result;
use crate::ledger::TxRecord;
use crate::types::balance::Balance;
use crate::types::ids::{CryptoId, TxId, UserId};
use crate::types::quantity::Quantity;

/// Storage contract for the append-only transaction log. The engine talks to
/// the ledger only through this trait so a durable backend (or a
/// fault-injecting test double) can stand in for the in-memory store.
pub trait LedgerStore: Send + Sync {
    /// Appends an immutable record and returns its assigned id.
    fn append(&self, record: TxRecord) -> Result<TxId>;

    /// Net holding for (user, crypto): buys count positive, sells negative,
    /// folded in insertion order. Zero when no records match.
    fn holding_of(&self, user_id: UserId, crypto_id: CryptoId) -> Result<Quantity>;

    /// All records for a user, newest first.
    fn entries_for_user(&self, user_id: UserId) -> Result<Vec<TxRecord>>;

    /// Distinct cryptocurrencies the user has ever traded, in first-trade
    /// order.
    fn cryptos_for_user(&self, user_id: UserId) -> Result<Vec<CryptoId>>;

    /// Signed cash flow the ledger implies for a user: sell proceeds minus
    /// buy costs. Starting balance plus this must equal the account balance.
    fn net_cash_flow(&self, user_id: UserId) -> Result<Balance>;
}
