//! Risk gate
//!
//! Stateless validation of a candidate order against static limits, applied
//! before the engine accepts the order. Checks run in a fixed sequence and
//! short-circuit on the first failure.

use types::error::ErrorCode;
use types::ids::Symbol;
use types::numeric::{Quantity, PRICE_SCALE};
use types::order::{Order, OrderType};

/// Static limits the gate enforces
#[derive(Debug, Clone)]
pub struct RiskLimits {
    pub max_order_size: Quantity,
    /// Maximum notional (price * quantity / PRICE_SCALE), fixed-point units
    pub max_notional: i64,
    pub allowed_symbols: Vec<Symbol>,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: Quantity::new(1000 * PRICE_SCALE),
            max_notional: 10_000_000 * PRICE_SCALE,
            allowed_symbols: vec![Symbol::from("BTC-USD"), Symbol::from("ETH-USD")],
        }
    }
}

/// Stateless order validator
#[derive(Debug, Clone, Default)]
pub struct RiskGate {
    limits: RiskLimits,
}

impl RiskGate {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// Validate a candidate order.
    ///
    /// Check order: quantity, limit price, symbol, order size, notional.
    pub fn check(&self, order: &Order) -> Result<(), ErrorCode> {
        if !order.quantity.is_positive() {
            return Err(ErrorCode::InvalidQuantity);
        }

        if order.order_type == OrderType::Limit && !order.price.is_positive() {
            return Err(ErrorCode::InvalidPrice);
        }

        if !self.is_valid_symbol(&order.symbol) {
            return Err(ErrorCode::InvalidSymbol);
        }

        if order.quantity > self.limits.max_order_size {
            return Err(ErrorCode::MaxOrderSizeExceeded);
        }

        if order.order_type == OrderType::Limit
            && order.price.notional(order.quantity) > self.limits.max_notional as i128
        {
            return Err(ErrorCode::MaxNotionalExceeded);
        }

        Ok(())
    }

    pub fn is_valid_symbol(&self, symbol: &Symbol) -> bool {
        self.limits.allowed_symbols.contains(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;
    use types::numeric::Price;
    use types::order::{OrderStatus, Side};

    fn limit_order(price: Price, quantity: Quantity) -> Order {
        Order {
            id: Default::default(),
            account_id: AccountId::from("trader"),
            symbol: Symbol::from("BTC-USD"),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price,
            quantity,
            remaining_qty: Quantity::ZERO,
            timestamp_ns: 0,
            status: OrderStatus::New,
            idempotency_key: None,
            client_order_id: None,
        }
    }

    #[test]
    fn test_valid_order_passes() {
        let gate = RiskGate::default();
        let order = limit_order(Price::from_major(10_000), Quantity::new(100));
        assert!(gate.check(&order).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let gate = RiskGate::default();
        let order = limit_order(Price::from_major(100), Quantity::ZERO);
        assert_eq!(gate.check(&order), Err(ErrorCode::InvalidQuantity));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let gate = RiskGate::default();
        let order = limit_order(Price::from_major(100), Quantity::new(-5));
        assert_eq!(gate.check(&order), Err(ErrorCode::InvalidQuantity));
    }

    #[test]
    fn test_limit_requires_positive_price() {
        let gate = RiskGate::default();
        let order = limit_order(Price::ZERO, Quantity::new(10));
        assert_eq!(gate.check(&order), Err(ErrorCode::InvalidPrice));
    }

    #[test]
    fn test_market_order_ignores_price() {
        let gate = RiskGate::default();
        let mut order = limit_order(Price::ZERO, Quantity::new(10));
        order.order_type = OrderType::Market;
        assert!(gate.check(&order).is_ok());
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let gate = RiskGate::default();
        let mut order = limit_order(Price::from_major(100), Quantity::new(10));
        order.symbol = Symbol::from("DOGE-USD");
        assert_eq!(gate.check(&order), Err(ErrorCode::InvalidSymbol));
    }

    #[test]
    fn test_oversized_order_rejected() {
        let gate = RiskGate::default();
        let order = limit_order(Price::new(1), Quantity::new(1001 * PRICE_SCALE));
        assert_eq!(gate.check(&order), Err(ErrorCode::MaxOrderSizeExceeded));
    }

    #[test]
    fn test_notional_limit_rejected() {
        let gate = RiskGate::default();
        // Within the size cap but past the notional cap
        let order = limit_order(Price::from_major(1_000_000), Quantity::new(20 * PRICE_SCALE));
        assert_eq!(gate.check(&order), Err(ErrorCode::MaxNotionalExceeded));

        // Same price, small quantity: fine
        let order = limit_order(Price::from_major(1_000_000), Quantity::new(20));
        assert!(gate.check(&order).is_ok());

        let limits = RiskLimits {
            max_notional: 50,
            ..RiskLimits::default()
        };
        let gate = RiskGate::new(limits);
        let order = limit_order(Price::from_major(100), Quantity::new(1));
        assert_eq!(gate.check(&order), Err(ErrorCode::MaxNotionalExceeded));
    }

    #[test]
    fn test_check_order_short_circuits() {
        // Bad quantity reported before bad symbol
        let gate = RiskGate::default();
        let mut order = limit_order(Price::from_major(100), Quantity::ZERO);
        order.symbol = Symbol::from("DOGE-USD");
        assert_eq!(gate.check(&order), Err(ErrorCode::InvalidQuantity));
    }
}
