//! # Submessage Dispatch Metrics
//!
//! Prometheus metrics for monitoring submessage dispatch.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-11-submessage-dispatch = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `submsg_executed_total` - Counter of executed submessages (by outcome)
//! - `submsg_replies_total` - Counter of reply calls (by result)
//! - `submsg_dispatch_aborts_total` - Counter of aborted dispatches (by reason)
//! - `submsg_limited_gas_total` - Gas charged by submessages with a gas limit

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Submessages executed, labeled by outcome (committed/discarded)
    pub static ref SUBMESSAGES_EXECUTED: CounterVec = register_counter_vec!(
        "submsg_executed_total",
        "Total number of submessages executed",
        &["outcome"]
    )
    .expect("Failed to create SUBMESSAGES_EXECUTED metric");

    /// Reply calls, labeled by result (ok/err)
    pub static ref REPLIES: CounterVec = register_counter_vec!(
        "submsg_replies_total",
        "Total number of reply calls",
        &["result"]
    )
    .expect("Failed to create REPLIES metric");

    /// Aborted dispatches, labeled by reason
    pub static ref DISPATCH_ABORTS: CounterVec = register_counter_vec!(
        "submsg_dispatch_aborts_total",
        "Total number of aborted dispatches",
        &["reason"]
    )
    .expect("Failed to create DISPATCH_ABORTS metric");

    /// Gas charged upward by gas-limited submessages
    pub static ref LIMITED_GAS: IntCounter = register_int_counter!(
        "submsg_limited_gas_total",
        "Total gas charged by submessages with a gas limit"
    )
    .expect("Failed to create LIMITED_GAS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a submessage whose layer was committed or discarded
#[cfg(feature = "metrics")]
pub fn record_submessage(committed: bool) {
    let outcome = if committed { "committed" } else { "discarded" };
    SUBMESSAGES_EXECUTED.with_label_values(&[outcome]).inc();
}

/// Record a reply call
#[cfg(feature = "metrics")]
pub fn record_reply(ok: bool) {
    let result = if ok { "ok" } else { "err" };
    REPLIES.with_label_values(&[result]).inc();
}

/// Record an aborted dispatch
#[cfg(feature = "metrics")]
pub fn record_dispatch_abort(reason: &str) {
    DISPATCH_ABORTS.with_label_values(&[reason]).inc();
}

/// Record gas charged by a gas-limited submessage
#[cfg(feature = "metrics")]
pub fn record_limited_gas(gas: u64) {
    LIMITED_GAS.inc_by(gas);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

/// Record a submessage whose layer was committed or discarded
#[cfg(not(feature = "metrics"))]
pub fn record_submessage(_committed: bool) {}

/// Record a reply call
#[cfg(not(feature = "metrics"))]
pub fn record_reply(_ok: bool) {}

/// Record an aborted dispatch
#[cfg(not(feature = "metrics"))]
pub fn record_dispatch_abort(_reason: &str) {}

/// Record gas charged by a gas-limited submessage
#[cfg(not(feature = "metrics"))]
pub fn record_limited_gas(_gas: u64) {}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_recording_increments_counters() {
        // Other tests share the registry, so compare lower bounds.
        let committed = SUBMESSAGES_EXECUTED.with_label_values(&["committed"]).get();
        let err_replies = REPLIES.with_label_values(&["err"]).get();
        let aborts = DISPATCH_ABORTS.with_label_values(&["context"]).get();
        let gas = LIMITED_GAS.get();

        record_submessage(true);
        record_reply(false);
        record_dispatch_abort("context");
        record_limited_gas(1_000);

        assert!(SUBMESSAGES_EXECUTED.with_label_values(&["committed"]).get() >= committed + 1.0);
        assert!(REPLIES.with_label_values(&["err"]).get() >= err_replies + 1.0);
        assert!(DISPATCH_ABORTS.with_label_values(&["context"]).get() >= aborts + 1.0);
        assert!(LIMITED_GAS.get() >= gas + 1_000);
    }
}
