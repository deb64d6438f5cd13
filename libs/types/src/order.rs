//! Order lifecycle types

use crate::ids::{AccountId, OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Rests on the book until filled or cancelled
    Limit,
    /// Executes immediately against available liquidity, never rests
    Market,
}

/// Order status
///
/// Valid transitions: NEW→PARTIAL→FILLED, NEW→FILLED, NEW→CANCELLED,
/// PARTIAL→CANCELLED, NEW→REJECTED. FILLED, CANCELLED and REJECTED are
/// terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Accepted, no fills yet
    #[default]
    New,
    /// Partially filled
    Partial,
    /// Completely filled (terminal)
    Filled,
    /// Cancelled by the caller (terminal)
    Cancelled,
    /// Failed validation or post-match rules (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// A single order
///
/// `id`, `timestamp_ns`, `remaining_qty` and `status` are assigned by the
/// engine at acceptance; placement requests leave them defaulted. Replay
/// deserialization trusts every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: OrderId,
    pub account_id: AccountId,
    pub symbol: Symbol,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Fixed-point limit price; zero for market orders
    #[serde(default)]
    pub price: Price,
    /// Original quantity, immutable after acceptance
    pub quantity: Quantity,
    /// Unfilled quantity, decreases monotonically
    #[serde(default)]
    pub remaining_qty: Quantity,
    #[serde(default)]
    pub timestamp_ns: u64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl Order {
    /// Check if the order can still trade or be cancelled
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::New | OrderStatus::Partial)
    }

    /// Quantity filled so far
    pub fn filled_qty(&self) -> Quantity {
        self.quantity - self.remaining_qty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(1),
            account_id: AccountId::from("alice"),
            symbol: Symbol::from("BTC-USD"),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: Price::from_major(10_000),
            quantity: Quantity::new(100),
            remaining_qty: Quantity::new(100),
            timestamp_ns: 1_708_123_456_789_000_000,
            status: OrderStatus::New,
            idempotency_key: None,
            client_order_id: None,
        }
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Partial.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_filled_qty() {
        let mut order = sample_order();
        assert_eq!(order.filled_qty(), Quantity::ZERO);

        order.remaining_qty = Quantity::new(40);
        assert_eq!(order.filled_qty(), Quantity::new(60));
    }

    #[test]
    fn test_order_serialization_round_trip() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        assert!(!json.contains("idempotency_key"));
        assert!(!json.contains("client_order_id"));
    }

    #[test]
    fn test_request_deserialization_defaults_engine_fields() {
        // A placement request carries only caller-supplied fields.
        let json = r#"{
            "account_id": "alice",
            "symbol": "BTC-USD",
            "side": "BUY",
            "type": "LIMIT",
            "price": 1000000000000,
            "quantity": 100
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, OrderId::new(0));
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.timestamp_ns, 0);
        assert_eq!(order.remaining_qty, Quantity::ZERO);
        assert_eq!(order.quantity, Quantity::new(100));
    }

    #[test]
    fn test_market_order_deserializes_without_price() {
        let json = r#"{
            "account_id": "bob",
            "symbol": "ETH-USD",
            "side": "SELL",
            "type": "MARKET",
            "quantity": 5
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.price, Price::ZERO);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&OrderType::Market).unwrap(), "\"MARKET\"");
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
    }

    #[test]
    fn test_unknown_side_rejected() {
        let result = serde_json::from_str::<Side>("\"HOLD\"");
        assert!(result.is_err());
    }
}
