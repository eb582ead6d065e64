use anyhow::Context;
use cryptoledger::accounts::AccountStore;
use cryptoledger::catalog::Catalog;
use cryptoledger::config::AppConfig;
use cryptoledger::engine::TradingEngine;
use cryptoledger::ledger::Ledger;
use cryptoledger::observability;
use cryptoledger::types::{Balance, Price, Quantity};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    observability::init();

    let env = std::env::var("CRYPTOLEDGER_ENV").unwrap_or_else(|_| "development".to_string());
    let app_config = AppConfig::load(&env).context("loading configuration")?;

    let catalog = Arc::new(Catalog::new());
    for seed in &app_config.catalog {
        let crypto = catalog
            .insert(&seed.symbol, &seed.name, Price::new(seed.price))
            .with_context(|| format!("seeding catalog entry {}", seed.symbol))?;
        info!(symbol = %crypto.symbol, price = %crypto.current_price, "catalog entry seeded");
    }

    let accounts = Arc::new(AccountStore::new(Balance::new(
        app_config.account.starting_balance,
    )));
    let ledger = Arc::new(Ledger::new());
    let engine = TradingEngine::new(catalog.clone(), accounts.clone(), ledger);

    // Demo round trip: register, buy, sell, report.
    let user = accounts
        .register("Demo User", "demo@example.com", "not-a-real-credential")
        .context("registering demo user")?;
    info!(user_id = %user.user_id, balance = %user.balance, "demo user registered");

    if let Some(crypto) = catalog.list().first() {
        let receipt = engine
            .buy(user.user_id, crypto.crypto_id, Quantity::new(Decimal::new(5, 3)))
            .context("demo buy")?;
        info!(tx_id = %receipt.tx_id, new_balance = %receipt.new_balance, "bought");

        let receipt = engine
            .sell(user.user_id, crypto.crypto_id, Quantity::new(Decimal::new(2, 3)))
            .context("demo sell")?;
        info!(tx_id = %receipt.tx_id, new_balance = %receipt.new_balance, "sold");
    }

    for entry in engine.portfolio(user.user_id)? {
        info!(
            symbol = %entry.symbol,
            quantity = %entry.quantity,
            price = %entry.current_price,
            "holding"
        );
    }

    engine.reconcile(user.user_id).context("reconciliation")?;
    info!("ledger and balance reconcile");

    let history = engine.transaction_history(user.user_id)?;
    println!("{}", serde_json::to_string_pretty(&history)?);

    Ok(())
}
