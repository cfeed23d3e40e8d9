//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build registry → Create monitors → Start monitors
//!
//! Shutdown:
//!     signals.rs (SIGTERM/SIGINT) → stop monitors → normalize groups → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then registry, then monitors
//! - Ordered shutdown: cancel schedules, finish in-flight cycles, normalize

pub mod signals;
pub mod startup;

pub use startup::{HealthSystem, StartupError};
