//! Ask (sell-side) book
//!
//! Sell orders keyed by price; the lowest price is the best ask. Mirror of
//! the bid book with the opposite iteration direction.

use std::collections::{BTreeMap, HashMap};
use types::ids::OrderId;
use types::numeric::Price;

use super::price_level::PriceLevel;

/// Sell side of an order book
///
/// Levels are stored ascending in the BTreeMap; the best ask is the first
/// key. Within a level, orders keep FIFO time priority.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
    /// order id -> price of the level holding it
    index: HashMap<OrderId, Price>,
}

impl AskBook {
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

    /// Best (lowest) ask price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Level at the best price
    pub fn best_level(&self) -> Option<&PriceLevel> {
        self.levels.iter().next().map(|(_, level)| level)
    }

    /// Levels in best-first (ascending price) order
    pub fn levels_best_first(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().map(|(price, level)| (*price, level))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_price_is_lowest() {
        let mut book = AskBook::new();
        book.insert(OrderId::new(1), Price::from_major(100));
        book.insert(OrderId::new(2), Price::from_major(98));
        book.insert(OrderId::new(3), Price::from_major(103));

        assert_eq!(book.best_price(), Some(Price::from_major(98)));
        assert_eq!(book.best_level().unwrap().front(), Some(OrderId::new(2)));
    }

    #[test]
    fn test_levels_best_first_ascending() {
        let mut book = AskBook::new();
        book.insert(OrderId::new(1), Price::from_major(101));
        book.insert(OrderId::new(2), Price::from_major(100));
        book.insert(OrderId::new(3), Price::from_major(102));

        let prices: Vec<Price> = book.levels_best_first().map(|(p, _)| p).collect();
        assert_eq!(
            prices,
            vec![
                Price::from_major(100),
                Price::from_major(101),
                Price::from_major(102)
            ]
        );
    }

    #[test]
    fn test_remove_drops_empty_level() {
        let mut book = AskBook::new();
        book.insert(OrderId::new(1), Price::from_major(100));
        book.insert(OrderId::new(2), Price::from_major(100));

        assert!(book.remove(OrderId::new(1)));
        assert_eq!(book.level_count(), 1);
        assert!(book.remove(OrderId::new(2)));
        assert!(book.is_empty());
    }
}
