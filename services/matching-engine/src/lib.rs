//! Matching engine
//!
//! Single-venue limit order book matching under price-time priority, with
//! durable event-sourced recovery.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced; trades execute at the resting
//!   order's price
//! - The book is never crossed after a public operation returns
//! - No self-trades
//! - Conservation of quantity per order and per symbol
//! - Replaying the event log reproduces order state exactly

pub mod book;
pub mod engine;
pub mod protocol;
pub mod risk;

pub use engine::MatchingEngine;
