use crate::accounts::AccountStore;
use crate::error::{Error, Result};
use crate::interfaces::ledger_store::LedgerStore;
use crate::interfaces::price_source::PriceSource;
use crate::ledger::{Side, TxRecord};
use crate::observability::trade_span;
use crate::types::balance::Balance;
use crate::types::ids::{CryptoId, TxId, UserId};
use crate::types::price::Price;
use crate::types::quantity::Quantity;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Result of a committed trade. The new balance comes out of the same atomic
/// step that applied it; there is no post-commit re-read that could fail and
/// leave the caller with a success but no balance.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TradeReceipt {
    pub tx_id: TxId,
    pub new_balance: Balance,
}

#[derive(Clone, Debug, Serialize)]
pub struct PortfolioEntry {
    pub crypto_id: CryptoId,
    pub symbol: String,
    pub name: String,
    pub current_price: Price,
    pub quantity: Quantity,
}

/// Orchestrates catalog lookup, holding computation, balance check and the
/// atomic {balance adjustment, ledger append} commit for a single buy or
/// sell. Each trade is a 3-phase protocol: validate, commit, report.
pub struct TradingEngine {
    catalog: Arc<dyn PriceSource>,
    accounts: Arc<AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl TradingEngine {
    pub fn new(
        catalog: Arc<dyn PriceSource>,
        accounts: Arc<AccountStore>,
        ledger: Arc<dyn LedgerStore>,
    ) -> Self {
        TradingEngine {
            catalog,
            accounts,
            ledger,
            user_locks: DashMap::new(),
        }
    }

    /// Per-user mutual exclusion around validate-then-commit. Different
    /// users never contend; two trades for the same user serialize here.
    fn lock_for(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn acquire(lock: &Arc<Mutex<()>>, user_id: UserId) -> Result<MutexGuard<'_, ()>> {
        lock.lock()
            .map_err(|_| Error::StorageFailure(format!("user lock poisoned: {}", user_id)))
    }

    pub fn buy(&self, user_id: UserId, crypto_id: CryptoId, quantity: Quantity) -> Result<TradeReceipt> {
        // Check 1: quantity must be strictly positive
        if !quantity.is_positive() {
            return Err(Error::InvalidQuantity(quantity));
        }

        // Check 2: resolve the price snapshot, once; this same snapshot
        // backs both the funds check and the committed record
        let crypto = self.catalog.resolve(crypto_id)?;
        let cost = quantity * crypto.current_price;

        let _span = trade_span(user_id, &crypto.symbol, Side::Buy).entered();

        let lock = self.lock_for(user_id);
        let _guard = Self::acquire(&lock, user_id)?;

        // Check 3: account must exist and be active
        self.accounts.require_active(user_id)?;

        // Check 4: sufficient funds
        let available = self.accounts.balance_of(user_id)?;
        if available < cost {
            warn!(%user_id, %cost, %available, "buy rejected: insufficient funds");
            return Err(Error::InsufficientFunds {
                required: cost,
                available,
            });
        }

        // Commit: debit, then append. The append is the fallible half; if it
        // fails the debit is compensated before the lock is released, so no
        // caller ever observes a balance without its ledger record.
        let new_balance = self.accounts.adjust_balance(user_id, -cost)?;
        let record = TxRecord::new(user_id, crypto_id, Side::Buy, quantity, crypto.current_price);
        let tx_id = match self.ledger.append(record) {
            Ok(tx_id) => tx_id,
            Err(err) => {
                self.accounts.adjust_balance(user_id, cost)?;
                return Err(err);
            }
        };

        info!(%user_id, %tx_id, %quantity, price = %crypto.current_price, %new_balance, "buy committed");
        Ok(TradeReceipt { tx_id, new_balance })
    }

    pub fn sell(&self, user_id: UserId, crypto_id: CryptoId, quantity: Quantity) -> Result<TradeReceipt> {
        // Check 1: quantity must be strictly positive
        if !quantity.is_positive() {
            return Err(Error::InvalidQuantity(quantity));
        }

        // Check 2: price snapshot, once per call
        let crypto = self.catalog.resolve(crypto_id)?;
        let proceeds = quantity * crypto.current_price;

        let _span = trade_span(user_id, &crypto.symbol, Side::Sell).entered();

        let lock = self.lock_for(user_id);
        let _guard = Self::acquire(&lock, user_id)?;

        // Check 3: account must exist and be active
        self.accounts.require_active(user_id)?;

        // Check 4: the ledger fold must cover the requested quantity
        let held = self.ledger.holding_of(user_id, crypto_id)?;
        if held < quantity {
            warn!(%user_id, %quantity, %held, "sell rejected: insufficient holding");
            return Err(Error::InsufficientHolding {
                requested: quantity,
                held,
            });
        }

        // Commit: credit, then append, compensating on append failure
        let new_balance = self.accounts.adjust_balance(user_id, proceeds)?;
        let record = TxRecord::new(user_id, crypto_id, Side::Sell, quantity, crypto.current_price);
        let tx_id = match self.ledger.append(record) {
            Ok(tx_id) => tx_id,
            Err(err) => {
                self.accounts.adjust_balance(user_id, -proceeds)?;
                return Err(err);
            }
        };

        info!(%user_id, %tx_id, %quantity, price = %crypto.current_price, %new_balance, "sell committed");
        Ok(TradeReceipt { tx_id, new_balance })
    }

    /// Current holdings joined against the catalog, filtered to positive
    /// quantities, ordered by display name. Pure read over committed state.
    pub fn portfolio(&self, user_id: UserId) -> Result<Vec<PortfolioEntry>> {
        let mut entries = Vec::new();
        for crypto_id in self.ledger.cryptos_for_user(user_id)? {
            let quantity = self.ledger.holding_of(user_id, crypto_id)?;
            if !quantity.is_positive() {
                continue;
            }
            let crypto = self.catalog.resolve(crypto_id)?;
            entries.push(PortfolioEntry {
                crypto_id,
                symbol: crypto.symbol,
                name: crypto.name,
                current_price: crypto.current_price,
                quantity,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Full trade history for the user, newest first.
    pub fn transaction_history(&self, user_id: UserId) -> Result<Vec<TxRecord>> {
        self.ledger.entries_for_user(user_id)
    }

    /// Balance read through the same lock trades take, so it can never
    /// observe the window between a balance adjustment and its append.
    pub fn balance_of(&self, user_id: UserId) -> Result<Balance> {
        let lock = self.lock_for(user_id);
        let _guard = Self::acquire(&lock, user_id)?;
        self.accounts.balance_of(user_id)
    }

    /// Audit check: the account balance must equal the starting balance plus
    /// the net cash flow the ledger implies.
    pub fn reconcile(&self, user_id: UserId) -> Result<()> {
        let lock = self.lock_for(user_id);
        let _guard = Self::acquire(&lock, user_id)?;

        let actual = self.accounts.balance_of(user_id)?;
        let expected = self.accounts.starting_balance() + self.ledger.net_cash_flow(user_id)?;
        if expected != actual {
            return Err(Error::ReconciliationFailed { expected, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Cryptocurrency;
    use crate::interfaces::price_source::MockPriceSource;
    use crate::ledger::Ledger;
    use rust_decimal::Decimal;

    fn fixture(price: i64) -> (Arc<MockPriceSource>, Arc<AccountStore>, Arc<Ledger>, CryptoId) {
        let crypto_id = CryptoId::new();
        let mut catalog = MockPriceSource::new();
        catalog.expect_resolve().returning(move |id| {
            Ok(Cryptocurrency {
                crypto_id: id,
                symbol: "BTC".to_string(),
                name: "Bitcoin".to_string(),
                current_price: Price::new(Decimal::from(price)),
            })
        });
        (
            Arc::new(catalog),
            Arc::new(AccountStore::new(Balance::new(Decimal::from(1000)))),
            Arc::new(Ledger::new()),
            crypto_id,
        )
    }

    #[test]
    fn buy_resolves_the_price_exactly_once() {
        let crypto_id = CryptoId::new();
        let mut catalog = MockPriceSource::new();
        catalog.expect_resolve().times(1).returning(|id| {
            Ok(Cryptocurrency {
                crypto_id: id,
                symbol: "BTC".to_string(),
                name: "Bitcoin".to_string(),
                current_price: Price::new(Decimal::from(100)),
            })
        });

        let accounts = Arc::new(AccountStore::new(Balance::new(Decimal::from(1000))));
        let user = accounts.register("Alice", "alice@example.com", "hash").unwrap();
        let engine = Arc::new(TradingEngine::new(
            Arc::new(catalog),
            accounts,
            Arc::new(Ledger::new()),
        ));

        engine
            .buy(user.user_id, crypto_id, Quantity::new(Decimal::from(2)))
            .unwrap();
    }

    #[test]
    fn non_positive_quantity_is_rejected_before_any_lookup() {
        let mut catalog = MockPriceSource::new();
        catalog.expect_resolve().times(0);

        let accounts = Arc::new(AccountStore::new(Balance::new(Decimal::from(1000))));
        let user = accounts.register("Bob", "bob@example.com", "hash").unwrap();
        let engine = TradingEngine::new(Arc::new(catalog), accounts, Arc::new(Ledger::new()));

        let result = engine.buy(user.user_id, CryptoId::new(), Quantity::zero());
        assert!(matches!(result, Err(Error::InvalidQuantity(_))));

        let result = engine.sell(
            user.user_id,
            CryptoId::new(),
            Quantity::new(Decimal::from(-1)),
        );
        assert!(matches!(result, Err(Error::InvalidQuantity(_))));
    }

    #[test]
    fn deactivated_account_cannot_trade() {
        let (catalog, accounts, ledger, crypto_id) = fixture(100);
        let user = accounts.register("Carol", "carol@example.com", "hash").unwrap();
        accounts.deactivate(user.user_id).unwrap();

        let engine = TradingEngine::new(catalog, accounts, ledger);
        let result = engine.buy(user.user_id, crypto_id, Quantity::new(Decimal::ONE));
        assert!(matches!(result, Err(Error::AccountInactive(_))));
    }

    #[test]
    fn record_carries_the_validation_price_snapshot() {
        let (catalog, accounts, ledger, crypto_id) = fixture(250);
        let user = accounts.register("Dave", "dave@example.com", "hash").unwrap();
        let engine = TradingEngine::new(catalog, accounts, Arc::clone(&ledger) as Arc<dyn LedgerStore>);

        engine
            .buy(user.user_id, crypto_id, Quantity::new(Decimal::from(2)))
            .unwrap();

        let entries = ledger.entries_for_user(user.user_id).unwrap();
        assert_eq!(entries[0].price, Price::new(Decimal::from(250)));
        assert_eq!(entries[0].total, Balance::new(Decimal::from(500)));
    }

    #[test]
    fn reconcile_holds_after_a_trade_sequence() {
        let (catalog, accounts, ledger, crypto_id) = fixture(100);
        let user = accounts.register("Erin", "erin@example.com", "hash").unwrap();
        let engine = TradingEngine::new(catalog, accounts, ledger);

        engine
            .buy(user.user_id, crypto_id, Quantity::new(Decimal::from(3)))
            .unwrap();
        engine
            .sell(user.user_id, crypto_id, Quantity::new(Decimal::from(1)))
            .unwrap();

        engine.reconcile(user.user_id).unwrap();
    }
}
