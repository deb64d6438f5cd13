//! Error taxonomy
//!
//! Every failure an engine operation or the line protocol can report. Codes
//! travel on the wire as their SCREAMING_SNAKE_CASE names; the `Display`
//! impl provides the human-readable message of the response envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure codes for engine operations and the line protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    #[error("Quantity must be positive")]
    InvalidQuantity,
    #[error("Price must be positive for limit orders")]
    InvalidPrice,
    #[error("Unknown or invalid symbol")]
    InvalidSymbol,
    #[error("Order size exceeds maximum allowed")]
    MaxOrderSizeExceeded,
    #[error("Order notional value exceeds maximum allowed")]
    MaxNotionalExceeded,
    #[error("Duplicate idempotency key")]
    DuplicateIdempotencyKey,

    // Matching
    #[error("No liquidity available for market order")]
    NoLiquidity,
    #[error("Order would result in self-trade")]
    SelfTradePrevented,

    // State lookup
    #[error("Order not found")]
    OrderNotFound,

    // Transport
    #[error("Malformed request")]
    ParseError,
    #[error("Unknown command")]
    UnknownCommand,
    #[error("Internal engine error")]
    InternalError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_wire_names() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::DuplicateIdempotencyKey).unwrap(),
            "\"DUPLICATE_IDEMPOTENCY_KEY\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::SelfTradePrevented).unwrap(),
            "\"SELF_TRADE_PREVENTED\""
        );
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ErrorCode::NoLiquidity.to_string(),
            "No liquidity available for market order"
        );
        assert_eq!(ErrorCode::OrderNotFound.to_string(), "Order not found");
    }
}
