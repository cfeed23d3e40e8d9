//! Origin health tracking for a reverse proxy.
//!
//! A concurrent registry of routing objects, tagged with their liveness, and
//! the background monitors that probe each load-balancing group and keep
//! those tags current.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod routing;

pub use config::ProxyConfig;
pub use health::{HealthCheckMonitoringService, HealthState, MonitorSettings};
pub use lifecycle::HealthSystem;
pub use registry::{ObjectStore, RoutingObjectRecord};
