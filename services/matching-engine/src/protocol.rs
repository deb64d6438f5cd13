//! Line protocol
//!
//! One JSON request per line in, one JSON response per line out. The
//! envelope echoes `req_id` verbatim; failures carry `{code, message}`.
//! Parse failures and unknown commands are reported in-band and never
//! terminate the driver loop.

use serde::Deserialize;
use serde_json::{json, Value};

use types::error::ErrorCode;
use types::ids::OrderId;
use types::order::Order;
use types::time::now_ns;

use crate::engine::MatchingEngine;

/// Result of handling one request line
pub struct LineOutcome {
    /// Serialized response envelope, one line, no trailing newline
    pub response: String,
    /// True when the request asked the driver to stop
    pub shutdown: bool,
}

#[derive(Deserialize)]
struct PlaceOrderParams {
    order: Order,
}

#[derive(Deserialize)]
struct OrderIdParams {
    order_id: u64,
}

#[derive(Deserialize)]
struct BookParams {
    symbol: String,
    #[serde(default = "default_depth")]
    depth: usize,
}

#[derive(Deserialize)]
struct TradesParams {
    symbol: String,
    #[serde(default = "default_trades_limit")]
    limit: usize,
}

fn default_depth() -> usize {
    10
}

fn default_trades_limit() -> usize {
    100
}

/// Handle one request line against the engine
pub fn handle_line(engine: &mut MatchingEngine, line: &str) -> LineOutcome {
    let request: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            let response = failure(
                "",
                ErrorCode::ParseError,
                &format!("JSON parse error: {}", err),
            );
            return LineOutcome {
                response: response.to_string(),
                shutdown: false,
            };
        }
    };

    let req_id = request
        .get("req_id")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let cmd = request
        .get("cmd")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let mut shutdown = false;
    let response = match cmd.as_str() {
        "place_order" => match params::<PlaceOrderParams>(&request) {
            Ok(p) => match engine.place_order(p.order) {
                Ok(result) => success(
                    &req_id,
                    json!({ "order": result.order, "trades": result.trades }),
                ),
                Err(rejection) => engine_failure(&req_id, rejection.code),
            },
            Err(response) => respond_parse_error(&req_id, response),
        },
        "cancel_order" => match params::<OrderIdParams>(&request) {
            Ok(p) => match engine.cancel_order(OrderId::new(p.order_id)) {
                Ok(order) => success(&req_id, json!({ "order": order })),
                Err(rejection) => engine_failure(&req_id, rejection.code),
            },
            Err(response) => respond_parse_error(&req_id, response),
        },
        "get_order" => match params::<OrderIdParams>(&request) {
            Ok(p) => match engine.get_order(OrderId::new(p.order_id)) {
                Some(order) => success(&req_id, json!({ "order": order })),
                None => engine_failure(&req_id, ErrorCode::OrderNotFound),
            },
            Err(response) => respond_parse_error(&req_id, response),
        },
        "get_book" => match params::<BookParams>(&request) {
            Ok(p) => {
                let (bids, asks) = engine.get_book_depth(&p.symbol, p.depth);
                success(
                    &req_id,
                    json!({ "symbol": p.symbol, "bids": bids, "asks": asks }),
                )
            }
            Err(response) => respond_parse_error(&req_id, response),
        },
        "get_trades" => match params::<TradesParams>(&request) {
            Ok(p) => {
                let trades = engine.get_trades(&p.symbol, p.limit);
                success(&req_id, json!({ "symbol": p.symbol, "trades": trades }))
            }
            Err(response) => respond_parse_error(&req_id, response),
        },
        "get_stats" => success(
            &req_id,
            serde_json::to_value(engine.get_stats())
                .expect("stats serialization should never fail"),
        ),
        "health" => success(
            &req_id,
            json!({ "status": "healthy", "timestamp_ns": now_ns() }),
        ),
        "shutdown" | "exit" | "quit" => {
            shutdown = true;
            success(&req_id, json!({ "status": "shutting_down" }))
        }
        other => failure(
            &req_id,
            ErrorCode::UnknownCommand,
            &format!("Unknown command: {}", other),
        ),
    };

    LineOutcome {
        response: response.to_string(),
        shutdown,
    }
}

fn params<T: for<'de> Deserialize<'de>>(request: &Value) -> Result<T, String> {
    serde_json::from_value(request.clone()).map_err(|err| err.to_string())
}

fn respond_parse_error(req_id: &str, detail: String) -> Value {
    failure(
        req_id,
        ErrorCode::ParseError,
        &format!("JSON parse error: {}", detail),
    )
}

fn success(req_id: &str, data: Value) -> Value {
    json!({ "req_id": req_id, "success": true, "data": data })
}

fn engine_failure(req_id: &str, code: ErrorCode) -> Value {
    failure(req_id, code, &code.to_string())
}

fn failure(req_id: &str, code: ErrorCode, message: &str) -> Value {
    json!({
        "req_id": req_id,
        "success": false,
        "error": { "code": code, "message": message }
    })
}
