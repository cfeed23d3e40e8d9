//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry from configuration
//! - Create one health check monitor per monitored group
//! - Start and stop the monitors as a unit
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Registry is fully populated before any monitor starts
//! - Monitors stop in configuration order, each normalizing its group

use std::sync::Arc;

use thiserror::Error;

use crate::config::ProxyConfig;
use crate::health::monitor::{HealthCheckMonitoringService, MonitorError, MonitorSettings};
use crate::health::probe::StatusRangeError;
use crate::registry::{ObjectStore, RegistryError};
use crate::routing::translator;
use crate::routing::RoutingError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build routing objects: {0}")]
    Routing(#[from] RoutingError),

    #[error("failed to populate registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("application '{app}': {source}")]
    HealthCheck {
        app: String,
        source: StatusRangeError,
    },

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Registry plus the monitors watching it.
pub struct HealthSystem {
    store: Arc<ObjectStore>,
    monitors: Vec<HealthCheckMonitoringService>,
}

impl HealthSystem {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, StartupError> {
        let store = Arc::new(ObjectStore::new());
        let inserted = store.insert_all(translator::routing_objects(config)?)?;

        let mut monitors = Vec::new();
        for app in &config.applications {
            let Some(hc) = &app.health_check else {
                tracing::info!(group = %app.id, "Health checks disabled for group");
                continue;
            };
            let settings = MonitorSettings::from_config(&app.id, hc).map_err(|source| {
                StartupError::HealthCheck {
                    app: app.id.clone(),
                    source,
                }
            })?;
            monitors.push(HealthCheckMonitoringService::new(store.clone(), settings));
        }

        tracing::info!(
            objects = inserted,
            monitored_groups = monitors.len(),
            "Registry populated"
        );
        Ok(Self { store, monitors })
    }

    pub fn store(&self) -> Arc<ObjectStore> {
        self.store.clone()
    }

    pub fn monitors(&self) -> &[HealthCheckMonitoringService] {
        &self.monitors
    }

    /// Start every monitor. If one fails, the monitors already started are
    /// stopped again before the error is returned.
    pub async fn start_all(&self) -> Result<(), StartupError> {
        for (started, monitor) in self.monitors.iter().enumerate() {
            if let Err(e) = monitor.start().await {
                tracing::error!(group = %monitor.group(), error = %e, "Failed to start health checks");
                for running in &self.monitors[..started] {
                    running.stop().await;
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    pub async fn stop_all(&self) {
        for monitor in &self.monitors {
            monitor.stop().await;
        }
    }
}
