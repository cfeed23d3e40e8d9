//! Active health checking for one load-balancing group.
//!
//! # Responsibilities
//! - Periodically probe every monitored member of the group
//! - Feed outcomes through the state machine and re-tag the registry
//! - On stop, return every non-administrative member to `state=active`
//!
//! # Lifecycle
//! ```text
//! Created --start()--> Running --stop()--> Stopped
//! Created --stop()---> Stopped
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::probe::{Prober, StatusClassifier, StatusRangeError};
use crate::health::state::{decode_tags, encode, next_state, HealthState};
use crate::health::tags::in_group;
use crate::observability::metrics;
use crate::registry::{ObjectStore, RoutingObjectRecord};

/// Lifecycle position of a monitoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Created,
    Running,
    Stopped,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    /// The runtime refused to schedule the check loop.
    #[error("failed to schedule health checks: {0}")]
    Scheduling(String),

    #[error("cannot {action} a health check monitor that is {state:?}")]
    IllegalState {
        action: &'static str,
        state: MonitorState,
    },
}

/// What one check cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    /// Members probed.
    pub probed: usize,
    /// Members skipped because of an administrative state.
    pub skipped: usize,
    /// Members whose state flipped between active and unreachable.
    pub transitions: usize,
    /// Members removed from the registry while their probe was in flight.
    pub vanished: usize,
}

/// Settings for one monitored group.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub group: String,
    pub probe_path: String,
    pub period: Duration,
    pub probe_timeout: Duration,
    pub active_threshold: u32,
    pub inactive_threshold: u32,
    pub classifier: StatusClassifier,
}

impl MonitorSettings {
    /// Settings with thresholds of 2 and a probe timeout equal to `period`.
    pub fn new(group: impl Into<String>, probe_path: impl Into<String>, period: Duration) -> Self {
        Self {
            group: group.into(),
            probe_path: probe_path.into(),
            period,
            probe_timeout: period,
            active_threshold: 2,
            inactive_threshold: 2,
            classifier: StatusClassifier::default(),
        }
    }

    pub fn from_config(group: &str, config: &HealthCheckConfig) -> Result<Self, StatusRangeError> {
        Ok(Self {
            group: group.to_string(),
            probe_path: config.uri.clone(),
            period: Duration::from_millis(config.interval_ms),
            probe_timeout: Duration::from_millis(config.timeout_ms),
            active_threshold: config.healthy_threshold,
            inactive_threshold: config.unhealthy_threshold,
            classifier: StatusClassifier::from_specs(&config.success_statuses)?,
        })
    }

    pub fn with_thresholds(mut self, active: u32, inactive: u32) -> Self {
        self.active_threshold = active;
        self.inactive_threshold = inactive;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_classifier(mut self, classifier: StatusClassifier) -> Self {
        self.classifier = classifier;
        self
    }
}

enum Lifecycle {
    Created,
    Running {
        cancel: watch::Sender<bool>,
        task: JoinHandle<()>,
    },
    Stopped,
}

impl Lifecycle {
    fn state(&self) -> MonitorState {
        match self {
            Lifecycle::Created => MonitorState::Created,
            Lifecycle::Running { .. } => MonitorState::Running,
            Lifecycle::Stopped => MonitorState::Stopped,
        }
    }
}

/// Probes the members of one load-balancing group and keeps their
/// `state=` / `healthcheck=` tags current.
pub struct HealthCheckMonitoringService {
    checker: Arc<Checker>,
    lifecycle: Mutex<Lifecycle>,
}

impl HealthCheckMonitoringService {
    pub fn new(store: Arc<ObjectStore>, settings: MonitorSettings) -> Self {
        let prober = Prober::new(
            settings.probe_path.clone(),
            settings.probe_timeout,
            settings.classifier.clone(),
        );
        Self {
            checker: Arc::new(Checker {
                store,
                settings,
                prober: Arc::new(prober),
            }),
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    pub fn group(&self) -> &str {
        &self.checker.settings.group
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.checker.settings
    }

    pub async fn state(&self) -> MonitorState {
        self.lifecycle.lock().await.state()
    }

    /// Schedule `run_checks` every `period`, first run one period from now.
    ///
    /// Only valid from `Created`. On error the service stays `Created`.
    pub async fn start(&self) -> Result<(), MonitorError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if !matches!(*lifecycle, Lifecycle::Created) {
            return Err(MonitorError::IllegalState {
                action: "start",
                state: lifecycle.state(),
            });
        }

        if self.checker.settings.period.is_zero() {
            return Err(MonitorError::Scheduling("check period must be non-zero".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MonitorError::Scheduling(e.to_string()))?;
        let (cancel, cancelled) = watch::channel(false);
        let task = runtime.spawn(self.checker.clone().run(cancelled));
        *lifecycle = Lifecycle::Running { cancel, task };

        let settings = &self.checker.settings;
        tracing::info!(
            group = %settings.group,
            path = %settings.probe_path,
            period_ms = settings.period.as_millis() as u64,
            active_threshold = settings.active_threshold,
            inactive_threshold = settings.inactive_threshold,
            "Health check monitor started"
        );
        Ok(())
    }

    /// Cancel the schedule, wait for an in-flight cycle, then reset every
    /// active or unreachable member to `Active(0)`.
    ///
    /// Idempotent. Returns the number of members rewritten.
    pub async fn stop(&self) -> usize {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Lifecycle::Running { cancel, task } =
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        {
            let _ = cancel.send(true);
            if let Err(e) = task.await {
                tracing::warn!(group = %self.group(), error = %e, "Health check task ended abnormally");
            }
        }

        let normalized = self.checker.normalize();
        tracing::info!(group = %self.group(), normalized, "Health check monitor stopped");
        normalized
    }

    /// Run one probe cycle now, independent of the schedule.
    pub async fn run_checks(&self) -> CheckSummary {
        self.checker.run_checks().await
    }
}

struct Checker {
    store: Arc<ObjectStore>,
    settings: MonitorSettings,
    prober: Arc<Prober>,
}

impl Checker {
    async fn run(self: Arc<Self>, mut cancelled: watch::Receiver<bool>) {
        let period = self.settings.period;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancelled.changed() => break,
                _ = ticker.tick() => {
                    self.run_checks().await;
                }
            }
        }
        tracing::debug!(group = %self.settings.group, "Health check loop exited");
    }

    async fn run_checks(&self) -> CheckSummary {
        let started = std::time::Instant::now();
        let group = self.settings.group.as_str();
        let mut summary = CheckSummary::default();

        // Membership is fixed for the whole cycle.
        let (monitored, administrative): (Vec<_>, Vec<_>) = self
            .store
            .snapshot(|tags| in_group(tags, group))
            .into_iter()
            .partition(|record| record.health().is_monitored());
        summary.skipped = administrative.len();

        let probes = monitored.into_iter().map(|record| {
            let prober = self.prober.clone();
            let handler = record.handler.clone();
            let task = tokio::spawn(async move { prober.probe(handler.as_ref()).await });
            async move {
                let passed = match task.await {
                    Ok(Ok(_)) => true,
                    Ok(Err(e)) => {
                        tracing::debug!(group, object = %record.name, error = %e, "Health check probe failed");
                        false
                    }
                    Err(e) => {
                        tracing::warn!(group, object = %record.name, error = %e, "Health check probe aborted");
                        false
                    }
                };
                (record, passed)
            }
        });

        for (record, passed) in join_all(probes).await {
            summary.probed += 1;
            metrics::record_probe(group, &record.name, passed);
            match self.apply(&record, passed) {
                Applied::Transitioned => summary.transitions += 1,
                Applied::Vanished => summary.vanished += 1,
                Applied::Unchanged => {}
            }
        }

        metrics::record_cycle_duration(group, started.elapsed());
        tracing::debug!(
            group,
            probed = summary.probed,
            skipped = summary.skipped,
            transitions = summary.transitions,
            vanished = summary.vanished,
            "Health check cycle complete"
        );
        summary
    }

    /// Commit one probe outcome. The next state is derived from the tags
    /// current at commit time, not from the cycle's snapshot.
    fn apply(&self, record: &RoutingObjectRecord, passed: bool) -> Applied {
        let group = self.settings.group.as_str();
        let mut change = None;

        let exists = self.store.update_tags(&record.name, |tags| {
            let current = decode_tags(tags);
            if !current.is_monitored() {
                change = None;
                return tags.clone();
            }
            let next = next_state(
                &current,
                passed,
                self.settings.active_threshold,
                self.settings.inactive_threshold,
            );
            let updated = encode(tags, &next);
            change = Some((current, next));
            updated
        });

        if !exists {
            tracing::debug!(group, object = %record.name, "Object removed during health check");
            return Applied::Vanished;
        }

        let Some((from, to)) = change else {
            return Applied::Unchanged;
        };
        metrics::record_routable(group, &record.name, to.is_routable());
        if from.state_value() == to.state_value() {
            return Applied::Unchanged;
        }

        tracing::info!(group, object = %record.name, from = %from, to = %to, "Origin health state changed");
        metrics::record_transition(group, &record.name, to.state_value());
        Applied::Transitioned
    }

    fn normalize(&self) -> usize {
        let group = self.settings.group.as_str();
        let mut normalized = 0;

        for record in self.store.snapshot(|tags| in_group(tags, group)) {
            let mut rewritten = false;
            self.store.update_tags(&record.name, |tags| {
                if !decode_tags(tags).is_monitored() {
                    rewritten = false;
                    return tags.clone();
                }
                let updated = encode(tags, &HealthState::Active(0));
                rewritten = updated != *tags;
                updated
            });

            if rewritten {
                normalized += 1;
                metrics::record_routable(group, &record.name, true);
                tracing::debug!(group, object = %record.name, "Reset to active after health checks stopped");
            }
        }
        normalized
    }
}

enum Applied {
    Unchanged,
    Transitioned,
    Vanished,
}
