pub mod ledger_store;
pub mod price_source;

pub use ledger_store::LedgerStore;
pub use price_source::PriceSource;
