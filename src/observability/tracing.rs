use crate::ledger::Side;
use crate::types::ids::UserId;
use tracing::Span;

pub fn trade_span(user_id: UserId, symbol: &str, side: Side) -> Span {
    tracing::info_span!(
        "trade",
        user_id = %user_id,
        symbol = %symbol,
        side = %side,
    )
}
