pub mod accounts;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod ledger;
pub mod observability;
pub mod types;

pub use crate::error::{Error, Result};
