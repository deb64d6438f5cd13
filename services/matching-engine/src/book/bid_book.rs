//! Bid (buy-side) book
//!
//! Buy orders keyed by price; the highest price is the best bid. BTreeMap
//! keeps iteration deterministic, and the id index makes removal
//! O(log P + k) where k is the level length.

use std::collections::{BTreeMap, HashMap};
use types::ids::OrderId;
use types::numeric::Price;

use super::price_level::PriceLevel;

/// Buy side of an order book
///
/// Levels are stored ascending in the BTreeMap; the best bid is the last
/// key. Within a level, orders keep FIFO time priority.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
    /// order id -> price of the level holding it
    index: HashMap<OrderId, Price>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order at the back of its price level
    pub fn insert(&mut self, order_id: OrderId, price: Price) {
        self.levels.entry(price).or_default().push(order_id);
        self.index.insert(order_id, price);
    }

    /// Remove an order; drops the level when it becomes empty.
    ///
    /// Returns true if the order was found.
    pub fn remove(&mut self, order_id: OrderId) -> bool {
        let Some(price) = self.index.remove(&order_id) else {
            return false;
        };
        if let Some(level) = self.levels.get_mut(&price) {
            level.remove(order_id);
            if level.is_empty() {
                self.levels.remove(&price);
            }
        }
        true
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Best (highest) bid price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Level at the best price
    pub fn best_level(&self) -> Option<&PriceLevel> {
        self.levels.iter().next_back().map(|(_, level)| level)
    }

    /// Levels in best-first (descending price) order
    pub fn levels_best_first(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().rev().map(|(price, level)| (*price, level))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
