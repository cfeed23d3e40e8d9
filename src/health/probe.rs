//! Probe execution and outcome classification.
//!
//! # Responsibilities
//! - Build the probe request (path, user agent, request id)
//! - Enforce the per-probe timeout
//! - Decide pass/fail from the handler's answer
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every probe has a deadline
//! - Transport error, timeout and rejected status are all plain failures
//! - Accepted statuses are configured, not hard-coded

use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tokio::time;
use uuid::Uuid;

use crate::routing::{LiveRequest, LiveResponse, RoutingError, RoutingObject};

pub const PROBE_USER_AGENT: &str = "origin-health-check";

/// Why a probe failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error(transparent)]
    Handler(#[from] RoutingError),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("unhealthy status {0}")]
    Status(u16),
}

/// Invalid entry in a success-status list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusRangeError {
    #[error("invalid status code '{0}'")]
    InvalidCode(String),

    #[error("status range '{0}' is empty")]
    EmptyRange(String),

    #[error("at least one success status is required")]
    NoStatuses,
}

/// Inclusive status range, written `"204"` or `"200-299"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRange(RangeInclusive<u16>);

impl FromStr for StatusRange {
    type Err = StatusRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = |v: &str| {
            v.trim()
                .parse::<u16>()
                .ok()
                .filter(|c| (100..=599).contains(c))
                .ok_or_else(|| StatusRangeError::InvalidCode(s.to_string()))
        };

        let range = match s.split_once('-') {
            Some((lo, hi)) => code(lo)?..=code(hi)?,
            None => {
                let c = code(s)?;
                c..=c
            }
        };
        if range.is_empty() {
            return Err(StatusRangeError::EmptyRange(s.to_string()));
        }
        Ok(StatusRange(range))
    }
}

/// Decides which response statuses count as a passing probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusClassifier {
    ranges: Vec<StatusRange>,
}

impl StatusClassifier {
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Result<Self, StatusRangeError> {
        if specs.is_empty() {
            return Err(StatusRangeError::NoStatuses);
        }
        let ranges = specs
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }

    pub fn is_success(&self, status: u16) -> bool {
        self.ranges.iter().any(|r| r.0.contains(&status))
    }
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self {
            ranges: vec![StatusRange(200..=299)],
        }
    }
}

/// Sends one probe to a routing object and classifies the answer.
#[derive(Debug, Clone)]
pub struct Prober {
    path: String,
    timeout: Duration,
    classifier: StatusClassifier,
}

impl Prober {
    pub fn new(path: impl Into<String>, timeout: Duration, classifier: StatusClassifier) -> Self {
        Self {
            path: path.into(),
            timeout,
            classifier,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// A fresh probe request.
    pub fn request(&self) -> LiveRequest {
        LiveRequest::get(self.path.clone())
            .header("user-agent", PROBE_USER_AGENT)
            .header("x-request-id", Uuid::new_v4().to_string())
    }

    /// Probe `handler` once. `Ok` only for an accepted status within the timeout.
    pub async fn probe(&self, handler: &dyn RoutingObject) -> Result<LiveResponse, ProbeError> {
        let response = time::timeout(self.timeout, handler.handle(self.request()))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;

        if self.classifier.is_success(response.status) {
            Ok(response)
        } else {
            Err(ProbeError::Status(response.status))
        }
    }
}
