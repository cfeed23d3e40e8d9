//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (monitor.rs):
//!     Periodic timer
//!     → snapshot of the group from the registry
//!     → probe.rs (send probe, apply timeout, classify status)
//!     → state.rs (decode tags → next state → encode tags)
//!     → registry update_tags(name, f)
//!
//! Tag grammar (tags.rs):
//!     state=active|unreachable|<admin>
//!     healthcheck=failing:<n> | healthcheck=passing:<n>
//!
//! State machine (state.rs):
//!     Active ←→ Unreachable
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - State transitions require consecutive successes/failures
//! - Health state lives in registry tags, not in the monitor
//! - Administrative states (e.g. closed) are never probed or rewritten
//! - Stopping the monitor returns monitored origins to active

pub mod monitor;
pub mod probe;
pub mod state;
pub mod tags;

pub use monitor::{CheckSummary, HealthCheckMonitoringService, MonitorError, MonitorSettings, MonitorState};
pub use probe::{ProbeError, Prober, StatusClassifier};
pub use state::{decode, decode_tags, encode, next_state, HealthState};
