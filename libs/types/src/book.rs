//! Aggregated order book level records

use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// One aggregated price level of an order book, best-first in depth queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    /// Sum of remaining quantity across the level's orders
    pub quantity: Quantity,
    pub order_count: usize,
}
