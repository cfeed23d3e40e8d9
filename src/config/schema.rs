//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the health
//! monitor. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Load-balancing groups and their origins.
    pub applications: Vec<ApplicationConfig>,
}

/// One load-balancing group.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApplicationConfig {
    /// Group name; origins are tagged `lbGroup=<id>`.
    pub id: String,

    /// Active health checking. Absent means the group is not monitored.
    #[serde(default)]
    pub health_check: Option<HealthCheckConfig>,

    /// Backend origins in this group.
    #[serde(default)]
    pub origins: Vec<OriginConfig>,
}

/// A single backend origin.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OriginConfig {
    /// Origin identifier, unique within its application.
    pub id: String,

    /// Origin address (e.g., "127.0.0.1:3000").
    pub host: String,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Path to probe.
    pub uri: String,

    /// Time between probe cycles in milliseconds.
    pub interval_ms: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Consecutive successes before an unreachable origin becomes active.
    pub healthy_threshold: u32,

    /// Consecutive failures before an active origin becomes unreachable.
    pub unhealthy_threshold: u32,

    /// Status codes counted as a passing probe, e.g. "200-299" or "204".
    pub success_statuses: Vec<String>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            uri: "/healthcheck".to_string(),
            interval_ms: 5000,
            timeout_ms: 2000,
            healthy_threshold: 2,
            unhealthy_threshold: 2,
            success_statuses: vec!["200-299".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format (pretty, json).
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9091".to_string(),
        }
    }
}
