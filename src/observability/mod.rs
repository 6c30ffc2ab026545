//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Round trips produce:
//!     → tracing events (connection id, target, status, elapsed)
//!     → metrics.rs (outcome counter, duration histogram)
//!
//! Consumers:
//!     → logging.rs installs a subscriber (CLI only)
//!     → metrics recorder chosen by the embedding application
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber or recorder
//! - Without a recorder, metric calls are no-ops

pub mod logging;
pub mod metrics;
