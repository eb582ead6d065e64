use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod loader;

pub use loader::AppConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccountConfig {
    /// Cash every newly registered account starts with.
    pub starting_balance: Decimal,
}

impl Default for AccountConfig {
    fn default() -> Self {
        AccountConfig {
            starting_balance: Decimal::from(1000),
        }
    }
}

/// One catalog entry seeded at startup. Prices move afterwards via
/// `Catalog::set_price`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CatalogSeed {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}
