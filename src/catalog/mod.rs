use crate::error::{Error, Result};
use crate::interfaces::price_source::PriceSource;
use crate::types::ids::CryptoId;
use crate::types::price::Price;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cryptocurrency {
    pub crypto_id: CryptoId,
    pub symbol: String,
    pub name: String,
    pub current_price: Price,
}

/// Read-only price catalog from the engine's point of view. Prices are set
/// and updated by an external collaborator between calls; the engine reads
/// one snapshot per trade.
pub struct Catalog {
    entries: DashMap<CryptoId, Cryptocurrency>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            entries: DashMap::new(),
        }
    }

    pub fn insert(&self, symbol: &str, name: &str, price: Price) -> Result<Cryptocurrency> {
        if !price.is_positive() {
            return Err(Error::InvalidPrice(format!(
                "{}: price must be positive, got {}",
                symbol, price
            )));
        }

        let crypto = Cryptocurrency {
            crypto_id: CryptoId::new(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            current_price: price,
        };
        self.entries.insert(crypto.crypto_id, crypto.clone());

        Ok(crypto)
    }

    pub fn get(&self, crypto_id: CryptoId) -> Result<Cryptocurrency> {
        self.entries
            .get(&crypto_id)
            .map(|entry| entry.clone())
            .ok_or(Error::CryptoNotFound(crypto_id))
    }

    /// External price update. Takes effect for the next trade; in-flight
    /// trades keep the snapshot they resolved at validation time.
    pub fn set_price(&self, crypto_id: CryptoId, price: Price) -> Result<()> {
        if !price.is_positive() {
            return Err(Error::InvalidPrice(format!(
                "{}: price must be positive, got {}",
                crypto_id, price
            )));
        }

        let mut entry = self
            .entries
            .get_mut(&crypto_id)
            .ok_or(Error::CryptoNotFound(crypto_id))?;
        entry.current_price = price;

        Ok(())
    }

    /// Full listing, ordered by display name.
    pub fn list(&self) -> Vec<Cryptocurrency> {
        let mut all: Vec<Cryptocurrency> =
            self.entries.iter().map(|entry| entry.clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceSource for Catalog {
    fn resolve(&self, crypto_id: CryptoId) -> Result<Cryptocurrency> {
        self.get(crypto_id)
    }
}
