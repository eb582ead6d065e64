pub mod balance;
pub mod ids;
pub mod price;
pub mod quantity;
pub mod timestamp;

pub use balance::Balance;
pub use ids::{CryptoId, TxId, UserId};
pub use price::Price;
pub use quantity::Quantity;
pub use timestamp::Timestamp;
