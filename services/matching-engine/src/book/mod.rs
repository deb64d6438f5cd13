//! Per-symbol order book
//!
//! Two price-ordered sides (bids descending, asks ascending) of FIFO levels,
//! plus id indexes for fast removal. The book stores order ids only; every
//! read of an order's fields goes through the engine's registry, which is the
//! single owner of order state.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::PriceLevel;

use std::collections::HashMap;
use types::book::BookLevel;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};

/// Order book for a single symbol
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Rest an order on its side.
    ///
    /// Only limit orders with remaining quantity ever rest; market orders
    /// never reach the book.
    pub fn add_order(&mut self, order: &Order) {
        debug_assert!(order.remaining_qty.is_positive());
        match order.side {
            Side::Buy => self.bids.insert(order.id, order.price),
            Side::Sell => self.asks.insert(order.id, order.price),
        }
    }

    /// Remove an order from whichever side holds it.
    ///
    /// Returns true if an order was found.
    pub fn remove_order(&mut self, order_id: OrderId) -> bool {
        self.bids.remove(order_id) || self.asks.remove(order_id)
    }

    /// Set a resting order's remaining quantity from the match loop.
    ///
    /// At zero the order becomes FILLED and leaves the book; otherwise it is
    /// marked PARTIAL. Returns false if the order is not registered.
    pub fn update_order_qty(
        &mut self,
        order_id: OrderId,
        new_remaining: Quantity,
        orders: &mut HashMap<OrderId, Order>,
    ) -> bool {
        let Some(order) = orders.get_mut(&order_id) else {
            return false;
        };
        order.remaining_qty = new_remaining;
        if new_remaining.is_zero() {
            order.status = OrderStatus::Filled;
            self.remove_order(order_id);
        } else {
            order.status = OrderStatus::Partial;
        }
        true
    }

    pub fn best_bid_price(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask_price(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Bid ids at the best level, in priority order
    pub fn bids_at_best(&self) -> Vec<OrderId> {
        self.bids
            .best_level()
            .map(|level| level.iter().collect())
            .unwrap_or_default()
    }

    /// Ask ids at the best level, in priority order
    pub fn asks_at_best(&self) -> Vec<OrderId> {
        self.asks
            .best_level()
            .map(|level| level.iter().collect())
            .unwrap_or_default()
    }

    /// Aggregate up to `depth` bid levels, best-first
    pub fn bid_levels(&self, depth: usize, orders: &HashMap<OrderId, Order>) -> Vec<BookLevel> {
        Self::aggregate(self.bids.levels_best_first().take(depth), orders)
    }

    /// Aggregate up to `depth` ask levels, best-first
    pub fn ask_levels(&self, depth: usize, orders: &HashMap<OrderId, Order>) -> Vec<BookLevel> {
        Self::aggregate(self.asks.levels_best_first().take(depth), orders)
    }

    /// True iff both sides are present and best bid >= best ask.
    ///
    /// A well-behaved book is never crossed after a public engine operation
    /// returns.
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid_price(), self.best_ask_price()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    fn aggregate<'a>(
        levels: impl Iterator<Item = (Price, &'a PriceLevel)>,
        orders: &HashMap<OrderId, Order>,
    ) -> Vec<BookLevel> {
        levels
            .map(|(price, level)| {
                let quantity = level
                    .iter()
                    .filter_map(|id| orders.get(&id))
                    .fold(Quantity::ZERO, |acc, order| acc + order.remaining_qty);
                BookLevel {
                    price,
                    quantity,
                    order_count: level.order_count(),
                }
            })
            .collect()
    }
}
