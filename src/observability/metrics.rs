//! Round-trip metrics.
//!
//! # Metrics
//! - `scgi_round_trips_total` (counter): round trips by `outcome`
//!   (`ok` or the error kind)
//! - `scgi_round_trip_duration_seconds` (histogram): wall time per round trip

use std::time::Instant;

use crate::error::ScgiError;

pub const ROUND_TRIPS_TOTAL: &str = "scgi_round_trips_total";
pub const ROUND_TRIP_DURATION: &str = "scgi_round_trip_duration_seconds";

/// Outcome label for a finished round trip.
pub fn outcome_label<T>(result: &Result<T, ScgiError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    }
}

/// Record a finished round trip.
pub fn record_round_trip(outcome: &'static str, start: Instant) {
    metrics::counter!(ROUND_TRIPS_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(ROUND_TRIP_DURATION).record(start.elapsed().as_secs_f64());
}
