//! Metrics collection.
//!
//! # Metrics
//! - `parity_sdk_calls_total` (counter): read-only calls by method, outcome
//! - `parity_sdk_transactions_submitted_total` (counter): submissions by method
//! - `parity_sdk_confirmation_wait_seconds` (histogram): mining wait by outcome
//! - `parity_sdk_logs_decoded_total` (counter): decoded logs by event
//! - `parity_sdk_active_subscriptions` (gauge): live log subscriptions
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; no-ops until the host installs a recorder
//! - Labels are method/event names only, never addresses or device ids

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Record a read-only contract call.
pub fn record_call(method: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "parity_sdk_calls_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a transaction handed to the transport.
pub fn record_transaction_submitted(method: &str) {
    counter!(
        "parity_sdk_transactions_submitted_total",
        "method" => method.to_string()
    )
    .increment(1);
}

/// Record how long a mining wait took and how it ended.
pub fn record_confirmation_wait(elapsed: Duration, outcome: &'static str) {
    histogram!("parity_sdk_confirmation_wait_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

/// Record decoded logs for an event.
pub fn record_logs_decoded(event: &str, count: usize) {
    counter!("parity_sdk_logs_decoded_total", "event" => event.to_string())
        .increment(count as u64);
}

/// Track a subscription being opened (`true`) or released (`false`).
pub fn record_subscription(active: bool) {
    let g = gauge!("parity_sdk_active_subscriptions");
    if active {
        g.increment(1.0);
    } else {
        g.decrement(1.0);
    }
}
