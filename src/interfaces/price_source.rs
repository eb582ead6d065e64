use crate::catalog::Cryptocurrency;
use crate::error::Result;
use crate::types::ids::CryptoId;

#[cfg(test)]
use mockall::automock;

/// What the trading engine needs from the price catalog: one snapshot per
/// call, resolved at the start of a trade and used for both the validation
/// and the committed record.
#[cfg_attr(test, automock)]
pub trait PriceSource: Send + Sync {
    fn resolve(&self, crypto_id: CryptoId) -> Result<Cryptocurrency>;
}
