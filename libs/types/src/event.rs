//! Durable event envelope
//!
//! Every state change the engine makes is recorded as one event in the
//! append-only log. Events are self-describing: each carries its own
//! sequence number, so a reader never depends on file position.

use serde::{Deserialize, Serialize};

/// Event type tag
///
/// Only ORDER_PLACED, ORDER_CANCELLED and TRADE_EXECUTED are currently
/// emitted; the remaining variants are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    OrderPlaced,
    OrderCancelled,
    OrderRejected,
    TradeExecuted,
    SnapshotMarker,
}

/// One record of the event log
///
/// Sequences are dense and strictly increasing, starting at 1. The payload
/// shape depends on the type: a full order for ORDER_PLACED, a full trade for
/// TRADE_EXECUTED, `{"order_id": n}` for ORDER_CANCELLED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub sequence: u64,
    pub timestamp_ns: u64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(
        sequence: u64,
        timestamp_ns: u64,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            sequence,
            timestamp_ns,
            event_type,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventType::OrderPlaced).unwrap(),
            "\"ORDER_PLACED\""
        );
        assert_eq!(
            serde_json::to_string(&EventType::TradeExecuted).unwrap(),
            "\"TRADE_EXECUTED\""
        );
        assert_eq!(
            serde_json::to_string(&EventType::SnapshotMarker).unwrap(),
            "\"SNAPSHOT_MARKER\""
        );
    }

    #[test]
    fn test_event_round_trip() {
        let event = Event::new(
            7,
            1_708_123_456_789_000_000,
            EventType::OrderCancelled,
            json!({"order_id": 3}),
        );
        let line = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(event, back);
        assert_eq!(back.payload["order_id"], 3);
    }

    #[test]
    fn test_event_uses_type_key_on_wire() {
        let event = Event::new(1, 0, EventType::OrderPlaced, json!({}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "ORDER_PLACED");
    }
}
