//! Firing metrics recorded through the `metrics` facade.
//!
//! Without an installed recorder every call here is a no-op.

use helper_sdt_abi::ProbeSite;
use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};

pub const FIRINGS_TOTAL: &str = "helper_sdt_firings_total";
pub const FRAMES_TOTAL: &str = "helper_sdt_frames_total";
pub const RETIRES_TOTAL: &str = "helper_sdt_retires_total";
pub const BACKTRACE_DEPTH: &str = "helper_sdt_backtrace_depth";

// ============================================================================
// Metric descriptions
// ============================================================================

/// Register metric descriptions. Call once at startup, after installing a recorder.
pub fn init() {
    describe_counter!(
        FIRINGS_TOTAL,
        Unit::Count,
        "Generic probe firings, by ABI version and arity"
    );
    describe_counter!(FRAMES_TOTAL, Unit::Count, "Backtrace frame firings");
    describe_counter!(RETIRES_TOTAL, Unit::Count, "Rule retire firings");
    describe_histogram!(
        BACKTRACE_DEPTH,
        Unit::Count,
        "Frames emitted per backtrace"
    );
}

// ============================================================================
// Metric recording functions
// ============================================================================

pub(crate) fn record_firing(site: ProbeSite) {
    counter!(
        FIRINGS_TOTAL,
        "abi" => site.version().as_str(),
        "arity" => site.arity().label()
    )
    .increment(1);
}

pub(crate) fn record_frame() {
    counter!(FRAMES_TOTAL).increment(1);
}

pub(crate) fn record_retire() {
    counter!(RETIRES_TOTAL).increment(1);
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn record_backtrace(depth: usize) {
    histogram!(BACKTRACE_DEPTH).record(depth as f64);
}
