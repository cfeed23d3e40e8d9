//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check identifiers are present, unique and free of `.`
//! - Validate value ranges (intervals > 0, thresholds >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ApplicationConfig, HealthCheckConfig, ProxyConfig};
use crate::health::probe::StatusClassifier;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("application id must not be empty")]
    EmptyApplicationId,

    #[error("duplicate application id '{0}'")]
    DuplicateApplication(String),

    /// Ids are joined as `<app>.<origin>`, so a dot would make names ambiguous.
    #[error("id '{0}' must not contain '.'")]
    DottedId(String),

    #[error("application '{app}': origin id must not be empty")]
    EmptyOriginId { app: String },

    #[error("application '{app}': duplicate origin id '{origin}'")]
    DuplicateOrigin { app: String, origin: String },

    #[error("application '{app}': origin '{origin}' has no host")]
    EmptyOriginHost { app: String, origin: String },

    #[error("application '{app}': health check uri '{uri}' must start with '/'")]
    InvalidProbePath { app: String, uri: String },

    #[error("application '{app}': {field} must be greater than zero")]
    ZeroValue { app: String, field: &'static str },

    #[error("application '{app}': {reason}")]
    InvalidSuccessStatus { app: String, reason: String },

    #[error("unknown log format '{0}' (expected pretty or json)")]
    UnknownLogFormat(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(obs.log_format.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    let mut seen = HashSet::new();
    for app in &config.applications {
        if app.id.is_empty() {
            errors.push(ValidationError::EmptyApplicationId);
        } else if !seen.insert(app.id.as_str()) {
            errors.push(ValidationError::DuplicateApplication(app.id.clone()));
        }
        if app.id.contains('.') {
            errors.push(ValidationError::DottedId(app.id.clone()));
        }
        validate_origins(app, &mut errors);
        if let Some(hc) = &app.health_check {
            validate_health_check(&app.id, hc, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_origins(app: &ApplicationConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for origin in &app.origins {
        if origin.id.is_empty() {
            errors.push(ValidationError::EmptyOriginId { app: app.id.clone() });
        } else if !seen.insert(origin.id.as_str()) {
            errors.push(ValidationError::DuplicateOrigin {
                app: app.id.clone(),
                origin: origin.id.clone(),
            });
        }
        if origin.id.contains('.') {
            errors.push(ValidationError::DottedId(origin.id.clone()));
        }
        if origin.host.trim().is_empty() {
            errors.push(ValidationError::EmptyOriginHost {
                app: app.id.clone(),
                origin: origin.id.clone(),
            });
        }
    }
}

fn validate_health_check(app: &str, hc: &HealthCheckConfig, errors: &mut Vec<ValidationError>) {
    if !hc.uri.starts_with('/') {
        errors.push(ValidationError::InvalidProbePath {
            app: app.to_string(),
            uri: hc.uri.clone(),
        });
    }

    let zero_checks = [
        ("interval_ms", hc.interval_ms == 0),
        ("timeout_ms", hc.timeout_ms == 0),
        ("healthy_threshold", hc.healthy_threshold == 0),
        ("unhealthy_threshold", hc.unhealthy_threshold == 0),
    ];
    for (field, is_zero) in zero_checks {
        if is_zero {
            errors.push(ValidationError::ZeroValue {
                app: app.to_string(),
                field,
            });
        }
    }

    if let Err(e) = StatusClassifier::from_specs(&hc.success_statuses) {
        errors.push(ValidationError::InvalidSuccessStatus {
            app: app.to_string(),
            reason: e.to_string(),
        });
    }
}
