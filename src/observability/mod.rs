//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! health::monitor produces:
//!     → logging.rs (structured log events: transitions, probe failures, lifecycle)
//!     → metrics.rs (probe counters, routable gauges, cycle histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
