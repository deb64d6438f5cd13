//! Trade execution types

use crate::ids::{AccountId, OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// An executed trade between a resting and an incoming order
///
/// The execution price is always the resting order's price; price improvement
/// accrues to the aggressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp_ns: u64,
    pub buyer_account_id: AccountId,
    pub seller_account_id: AccountId,
}

impl Trade {
    /// Buyer and seller must be distinct accounts
    pub fn has_distinct_accounts(&self) -> bool {
        self.buyer_account_id != self.seller_account_id
    }
}
