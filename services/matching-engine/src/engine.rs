//! Matching engine core
//!
//! Owns the order registry, the per-symbol books, the trade history and the
//! id counters, and drives the event log and snapshot store. All state
//! mutation happens on the caller's thread; the engine is never entered
//! re-entrantly.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use persistence::{EventLog, Snapshot, SnapshotStore};
use types::error::ErrorCode;
use types::event::{Event, EventType};
use types::ids::{OrderId, Symbol, TradeId};
use types::numeric::Quantity;
use types::order::{Order, OrderStatus, OrderType, Side};
use types::time::now_ns;
use types::trade::Trade;

use crate::book::OrderBook;
use crate::risk::{RiskGate, RiskLimits};

/// Default number of events between periodic snapshots
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 1000;

/// Counters reported by `get_stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub total_orders: u64,
    pub total_trades: u64,
    pub total_cancels: u64,
    pub total_rejects: u64,
    pub event_sequence: u64,
}

/// Successful placement: the accepted order snapshot and its fills
#[derive(Debug, Clone)]
pub struct PlaceOrderResult {
    pub order: Order,
    pub trades: Vec<Trade>,
}

/// A rejected operation.
///
/// `order` carries the order snapshot in its rejected (or terminal) state
/// when one exists; its id is 0 when rejection happened before id
/// assignment.
#[derive(Debug, Clone, Error)]
#[error("{code}")]
pub struct OrderRejection {
    pub code: ErrorCode,
    pub order: Option<Order>,
}

impl OrderRejection {
    fn new(code: ErrorCode, order: Option<Order>) -> Self {
        Self { code, order }
    }
}

/// The engine
pub struct MatchingEngine {
    books: HashMap<Symbol, OrderBook>,
    /// Registry owning every order for the engine's lifetime, terminal ones
    /// included
    orders: HashMap<OrderId, Order>,
    trades: Vec<Trade>,
    idempotency_keys: HashSet<String>,
    next_order_id: u64,
    next_trade_id: u64,
    event_log: EventLog,
    snapshots: SnapshotStore,
    risk: RiskGate,
    stats: EngineStats,
}

impl MatchingEngine {
    /// Create an engine over the given durability paths.
    ///
    /// `event_log` of `None` disables durability; `snapshot_dir` of `None`
    /// disables snapshots.
    pub fn new(
        event_log: Option<PathBuf>,
        snapshot_dir: Option<PathBuf>,
        snapshot_interval: u64,
    ) -> Self {
        Self {
            books: HashMap::new(),
            orders: HashMap::new(),
            trades: Vec::new(),
            idempotency_keys: HashSet::new(),
            next_order_id: 1,
            next_trade_id: 1,
            event_log: EventLog::new(event_log),
            snapshots: SnapshotStore::new(snapshot_dir, snapshot_interval),
            risk: RiskGate::default(),
            stats: EngineStats::default(),
        }
    }

    /// Engine with no durability, used by tests and dry runs
    pub fn in_memory() -> Self {
        Self::new(None, None, DEFAULT_SNAPSHOT_INTERVAL)
    }

    /// Replace the default risk limits
    pub fn with_risk_limits(mut self, limits: RiskLimits) -> Self {
        self.risk = RiskGate::new(limits);
        self
    }

    // ── Placement ───────────────────────────────────────────────────

    /// Accept, match and rest (or reject) an incoming order.
    ///
    /// On success the returned order snapshot reflects the post-match state
    /// and `trades` lists the fills in match order.
    pub fn place_order(&mut self, request: Order) -> Result<PlaceOrderResult, OrderRejection> {
        // Idempotency gate: a duplicate key has no side effects at all.
        if let Some(key) = nonempty_key(&request.idempotency_key) {
            if self.idempotency_keys.contains(key) {
                self.stats.total_rejects += 1;
                return Err(OrderRejection::new(
                    ErrorCode::DuplicateIdempotencyKey,
                    Some(rejected(request)),
                ));
            }
        }

        if let Err(code) = self.risk.check(&request) {
            self.stats.total_rejects += 1;
            return Err(OrderRejection::new(code, Some(rejected(request))));
        }

        // Acceptance: assign identity and store before matching.
        let mut order = request;
        order.id = OrderId::new(self.next_order_id);
        self.next_order_id += 1;
        order.timestamp_ns = now_ns();
        order.remaining_qty = order.quantity;
        order.status = OrderStatus::New;

        if let Some(key) = nonempty_key(&order.idempotency_key) {
            self.idempotency_keys.insert(key.to_string());
        }

        let id = order.id;
        let symbol = order.symbol.clone();
        let payload =
            serde_json::to_value(&order).expect("order serialization should never fail");
        self.orders.insert(id, order);
        self.log_event(EventType::OrderPlaced, payload);
        self.stats.total_orders += 1;

        let trades = self.run_match(id);

        let result = self.dispose_after_match(id, &symbol, trades);
        self.maybe_snapshot();
        result
    }

    /// Post-match disposition: fill status, market-order rules, resting.
    fn dispose_after_match(
        &mut self,
        id: OrderId,
        symbol: &Symbol,
        trades: Vec<Trade>,
    ) -> Result<PlaceOrderResult, OrderRejection> {
        let (remaining, quantity, order_type, side, price) = {
            let order = &self.orders[&id];
            (
                order.remaining_qty,
                order.quantity,
                order.order_type,
                order.side,
                order.price,
            )
        };

        if remaining.is_zero() {
            self.set_status(id, OrderStatus::Filled);
        } else if order_type == OrderType::Market {
            if remaining == quantity {
                // No fills at all: nothing for the market order to do.
                self.set_status(id, OrderStatus::Rejected);
                self.stats.total_rejects += 1;
                return Err(OrderRejection::new(
                    ErrorCode::NoLiquidity,
                    Some(self.orders[&id].clone()),
                ));
            }
            // Partial fill; market orders never rest.
            self.set_status(id, OrderStatus::Partial);
        } else {
            // Unfilled limit remainder. Resting it must not cross the book;
            // a crossing remainder can only arise when self-trade prevention
            // stopped the match loop against our own resting order.
            let book = self
                .books
                .get(symbol.as_str())
                .expect("book exists after matching");
            let would_cross = match side {
                Side::Buy => book.best_ask_price().map_or(false, |ask| price >= ask),
                Side::Sell => book.best_bid_price().map_or(false, |bid| price <= bid),
            };

            if would_cross {
                self.set_status(id, OrderStatus::Rejected);
                self.stats.total_rejects += 1;
                return Err(OrderRejection::new(
                    ErrorCode::SelfTradePrevented,
                    Some(self.orders[&id].clone()),
                ));
            }

            let status = if remaining < quantity {
                OrderStatus::Partial
            } else {
                OrderStatus::New
            };
            self.set_status(id, status);
            let order = self.orders[&id].clone();
            self.books
                .get_mut(symbol.as_str())
                .expect("book exists after matching")
                .add_order(&order);
        }

        Ok(PlaceOrderResult {
            order: self.orders[&id].clone(),
            trades,
        })
    }

    // ── Matching ────────────────────────────────────────────────────

    /// Match an incoming order against the opposite side of its book.
    ///
    /// Trades are produced in price-then-time order of the resting side and
    /// each one is logged before quantities change hands. Self-trade
    /// prevention stops the whole loop: it does not skip to the next resting
    /// order.
    fn run_match(&mut self, incoming_id: OrderId) -> Vec<Trade> {
        let (symbol, side, order_type, limit_price, account) = {
            let order = &self.orders[&incoming_id];
            (
                order.symbol.clone(),
                order.side,
                order.order_type,
                order.price,
                order.account_id.clone(),
            )
        };
        self.get_or_create_book(&symbol);

        let mut trades = Vec::new();
        loop {
            let remaining = self.orders[&incoming_id].remaining_qty;
            if !remaining.is_positive() {
                break;
            }

            let book = &self.books[symbol.as_str()];
            let best_id = match side {
                Side::Buy => book.asks_at_best().first().copied(),
                Side::Sell => book.bids_at_best().first().copied(),
            };
            let Some(best_id) = best_id else {
                break;
            };

            let (best_price, best_account, best_remaining) = {
                let best = self
                    .orders
                    .get(&best_id)
                    .expect("book references a registered order");
                (best.price, best.account_id.clone(), best.remaining_qty)
            };

            // Limit orders stop at the first unacceptable price.
            if order_type == OrderType::Limit {
                let acceptable = match side {
                    Side::Buy => best_price <= limit_price,
                    Side::Sell => best_price >= limit_price,
                };
                if !acceptable {
                    break;
                }
            }

            // Self-trade prevention: stop the entire match.
            if account == best_account {
                break;
            }

            let qty = remaining.min(best_remaining);
            let trade_id = TradeId::new(self.next_trade_id);
            self.next_trade_id += 1;

            // Trade at the resting order's price; buyer/seller by side.
            let trade = match side {
                Side::Buy => Trade {
                    id: trade_id,
                    buy_order_id: incoming_id,
                    sell_order_id: best_id,
                    symbol: symbol.clone(),
                    price: best_price,
                    quantity: qty,
                    timestamp_ns: now_ns(),
                    buyer_account_id: account.clone(),
                    seller_account_id: best_account,
                },
                Side::Sell => Trade {
                    id: trade_id,
                    buy_order_id: best_id,
                    sell_order_id: incoming_id,
                    symbol: symbol.clone(),
                    price: best_price,
                    quantity: qty,
                    timestamp_ns: now_ns(),
                    buyer_account_id: best_account,
                    seller_account_id: account.clone(),
                },
            };

            let payload =
                serde_json::to_value(&trade).expect("trade serialization should never fail");
            self.trades.push(trade.clone());
            self.log_event(EventType::TradeExecuted, payload);
            self.stats.total_trades += 1;
            trades.push(trade);

            let incoming = self
                .orders
                .get_mut(&incoming_id)
                .expect("incoming order is registered");
            incoming.remaining_qty = incoming.remaining_qty - qty;

            let book = self
                .books
                .get_mut(symbol.as_str())
                .expect("book exists while matching");
            book.update_order_qty(best_id, best_remaining - qty, &mut self.orders);
        }

        trades
    }

    // ── Cancellation ────────────────────────────────────────────────

    /// Cancel a live order.
    ///
    /// Unknown ids and terminal orders both report ORDER_NOT_FOUND; the
    /// terminal case includes the order snapshot.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<Order, OrderRejection> {
        let Some(order) = self.orders.get(&order_id) else {
            return Err(OrderRejection::new(ErrorCode::OrderNotFound, None));
        };

        if order.status.is_terminal() {
            return Err(OrderRejection::new(
                ErrorCode::OrderNotFound,
                Some(order.clone()),
            ));
        }

        let symbol = order.symbol.clone();
        if let Some(book) = self.books.get_mut(symbol.as_str()) {
            book.remove_order(order_id);
        }

        self.set_status(order_id, OrderStatus::Cancelled);
        self.log_event(
            EventType::OrderCancelled,
            json!({ "order_id": order_id }),
        );
        self.stats.total_cancels += 1;

        let cancelled = self.orders[&order_id].clone();
        self.maybe_snapshot();
        Ok(cancelled)
    }

    // ── Recovery ────────────────────────────────────────────────────

    /// Restore engine state from the latest snapshot plus the event log.
    ///
    /// Returns false when there is nothing to recover from. Replay never
    /// invokes the match loop: trades in the log are facts, not decisions.
    pub fn recover(&mut self) -> bool {
        if let Some(snapshot) = self.snapshots.load_latest() {
            self.orders.clear();
            self.books.clear();
            self.trades.clear();
            self.idempotency_keys.clear();

            for order in &snapshot.orders {
                if order.is_active()
                    && order.order_type == OrderType::Limit
                    && order.remaining_qty.is_positive()
                {
                    self.get_or_create_book(&order.symbol).add_order(order);
                }
                if let Some(key) = nonempty_key(&order.idempotency_key) {
                    self.idempotency_keys.insert(key.to_string());
                }
                self.orders.insert(order.id, order.clone());
            }

            self.next_order_id = snapshot.next_order_id;
            self.next_trade_id = snapshot.next_trade_id;

            let events = self.event_log.read_from(snapshot.sequence + 1);
            let last_sequence = events
                .last()
                .map(|e| e.sequence)
                .unwrap_or(snapshot.sequence);
            self.replay_events(&events);
            self.event_log.set_sequence(last_sequence.max(snapshot.sequence));

            info!(
                snapshot_sequence = snapshot.sequence,
                replayed = events.len(),
                "recovered from snapshot"
            );
            return true;
        }

        let events = self.event_log.read_all();
        if events.is_empty() {
            return false;
        }

        let last_sequence = events.last().map(|e| e.sequence).unwrap_or(0);
        self.replay_events(&events);
        self.event_log.set_sequence(last_sequence);

        info!(replayed = events.len(), "recovered from event log");
        true
    }

    /// Apply a slice of events to in-memory state, in order
    pub fn replay_events(&mut self, events: &[Event]) {
        for event in events {
            match event.event_type {
                EventType::OrderPlaced => self.replay_order_placed(event),
                EventType::TradeExecuted => self.replay_trade_executed(event),
                EventType::OrderCancelled => self.replay_order_cancelled(event),
                _ => {}
            }
        }
    }

    fn replay_order_placed(&mut self, event: &Event) {
        let order: Order = match serde_json::from_value(event.payload.clone()) {
            Ok(order) => order,
            Err(err) => {
                warn!(sequence = event.sequence, %err, "skipping unreadable ORDER_PLACED payload");
                return;
            }
        };

        // Already present means the snapshot covered it.
        if self.orders.contains_key(&order.id) {
            return;
        }

        if order.is_active()
            && order.order_type == OrderType::Limit
            && order.remaining_qty.is_positive()
        {
            self.get_or_create_book(&order.symbol).add_order(&order);
        }
        if let Some(key) = nonempty_key(&order.idempotency_key) {
            self.idempotency_keys.insert(key.to_string());
        }
        self.next_order_id = self.next_order_id.max(order.id.as_u64() + 1);
        self.orders.insert(order.id, order);
    }

    fn replay_trade_executed(&mut self, event: &Event) {
        let trade: Trade = match serde_json::from_value(event.payload.clone()) {
            Ok(trade) => trade,
            Err(err) => {
                warn!(sequence = event.sequence, %err, "skipping unreadable TRADE_EXECUTED payload");
                return;
            }
        };

        self.next_trade_id = self.next_trade_id.max(trade.id.as_u64() + 1);
        self.apply_fill(trade.buy_order_id, trade.quantity);
        self.apply_fill(trade.sell_order_id, trade.quantity);
        self.trades.push(trade);
    }

    fn replay_order_cancelled(&mut self, event: &Event) {
        let Some(order_id) = event.payload.get("order_id").and_then(|v| v.as_u64()) else {
            warn!(sequence = event.sequence, "ORDER_CANCELLED payload missing order_id");
            return;
        };
        let order_id = OrderId::new(order_id);

        let Some(order) = self.orders.get_mut(&order_id) else {
            return;
        };
        order.status = OrderStatus::Cancelled;
        let symbol = order.symbol.clone();
        if let Some(book) = self.books.get_mut(symbol.as_str()) {
            book.remove_order(order_id);
        }
    }

    /// Reduce one side of a replayed trade, clamping at zero
    fn apply_fill(&mut self, order_id: OrderId, quantity: Quantity) {
        let Some(order) = self.orders.get_mut(&order_id) else {
            return;
        };
        order.remaining_qty = (order.remaining_qty - quantity).saturating_to_zero();
        let symbol = order.symbol.clone();
        if order.remaining_qty.is_zero() {
            order.status = OrderStatus::Filled;
            if let Some(book) = self.books.get_mut(symbol.as_str()) {
                book.remove_order(order_id);
            }
        } else {
            order.status = OrderStatus::Partial;
        }
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Build a snapshot of all currently active orders, tagged with the
    /// log's current sequence.
    ///
    /// Orders are sorted by id (assignment order) so that restoring them
    /// reproduces each level's time priority exactly.
    pub fn create_snapshot(&self) -> Snapshot {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|order| order.is_active())
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.id);

        Snapshot {
            sequence: self.event_log.current_sequence(),
            timestamp_ns: now_ns(),
            next_order_id: self.next_order_id,
            next_trade_id: self.next_trade_id,
            orders,
        }
    }

    fn maybe_snapshot(&mut self) {
        if !self.snapshots.should_snapshot(self.event_log.current_sequence()) {
            return;
        }
        let snapshot = self.create_snapshot();
        match self.snapshots.save(&snapshot) {
            Ok(path) => debug!(sequence = snapshot.sequence, path = %path.display(), "snapshot saved"),
            Err(err) => warn!(%err, "snapshot save failed"),
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn get_order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn get_book(&self, symbol: &str) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Aggregated (bids, asks) to `depth` levels; empty when the symbol has
    /// no book
    pub fn get_book_depth(
        &self,
        symbol: &str,
        depth: usize,
    ) -> (Vec<types::book::BookLevel>, Vec<types::book::BookLevel>) {
        match self.books.get(symbol) {
            Some(book) => (
                book.bid_levels(depth, &self.orders),
                book.ask_levels(depth, &self.orders),
            ),
            None => (Vec::new(), Vec::new()),
        }
    }

    /// Up to `limit` most recent trades for `symbol`, oldest first.
    ///
    /// Scans newest-first to bound the work, then reverses.
    pub fn get_trades(&self, symbol: &str, limit: usize) -> Vec<Trade> {
        if limit == 0 {
            return Vec::new();
        }
        let mut out: Vec<Trade> = self
            .trades
            .iter()
            .rev()
            .filter(|trade| trade.symbol.as_str() == symbol)
            .take(limit)
            .cloned()
            .collect();
        out.reverse();
        out
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            event_sequence: self.event_log.current_sequence(),
            ..self.stats
        }
    }

    /// Flush and fsync the event log (teardown)
    pub fn flush(&self) {
        if let Err(err) = self.event_log.sync() {
            warn!(%err, "event log sync failed on shutdown");
        }
    }

    // ── Internal ────────────────────────────────────────────────────

    fn get_or_create_book(&mut self, symbol: &Symbol) -> &mut OrderBook {
        self.books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol.clone()))
    }

    fn set_status(&mut self, order_id: OrderId, status: OrderStatus) {
        if let Some(order) = self.orders.get_mut(&order_id) {
            order.status = status;
        }
    }

    fn log_event(&mut self, event_type: EventType, payload: serde_json::Value) {
        let event = Event::new(
            self.event_log.next_sequence(),
            now_ns(),
            event_type,
            payload,
        );
        if let Err(err) = self.event_log.append(&event) {
            warn!(%err, "event append failed, continuing without durability");
        }
    }
}

/// Idempotency key, treating the empty string as absent
fn nonempty_key(key: &Option<String>) -> Option<&str> {
    key.as_deref().filter(|k| !k.is_empty())
}

/// Mark a not-yet-accepted request as rejected (id stays 0)
fn rejected(mut order: Order) -> Order {
    order.status = OrderStatus::Rejected;
    order
}
