//! Origin health state machine.
//!
//! # States
//! - Active(n): origin receives traffic, `n` consecutive failed probes so far
//! - Unreachable(n): origin excluded, `n` consecutive passed probes so far
//! - Other(v): administrative or unknown state, never changed by probing
//!
//! # State Transitions
//! ```text
//! Active(n)      --fail-->  Unreachable(0)   if n+1 >= inactive_threshold
//! Active(n)      --fail-->  Active(n+1)      otherwise
//! Active(n)      --pass-->  Active(0)
//! Unreachable(n) --pass-->  Active(0)        if n+1 >= active_threshold
//! Unreachable(n) --pass-->  Unreachable(n+1) otherwise
//! Unreachable(n) --fail-->  Unreachable(0)
//! Other(v)       --any--->  Other(v)
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping
//! - State is rebuilt from tags on every cycle, nothing is cached
//! - Counters reset on state transition

use std::collections::BTreeSet;
use std::fmt;

use crate::health::tags::{
    self, HealthTags, COUNTER_FAILING, COUNTER_PASSING, STATE_ACTIVE, STATE_UNREACHABLE,
};

/// Liveness of a single routing object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthState {
    Active(u32),
    Unreachable(u32),
    Other(String),
}

impl HealthState {
    /// Whether probing applies to this state at all.
    pub fn is_monitored(&self) -> bool {
        !matches!(self, HealthState::Other(_))
    }

    /// Whether the live routing path may send traffic here.
    pub fn is_routable(&self) -> bool {
        matches!(self, HealthState::Active(_))
    }

    /// The `state=` value this health renders to.
    pub fn state_value(&self) -> &str {
        match self {
            HealthState::Active(_) => STATE_ACTIVE,
            HealthState::Unreachable(_) => STATE_UNREACHABLE,
            HealthState::Other(v) => v,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Active(0) => write!(f, "active"),
            HealthState::Active(n) => write!(f, "active (failing {n})"),
            HealthState::Unreachable(0) => write!(f, "unreachable"),
            HealthState::Unreachable(n) => write!(f, "unreachable (passing {n})"),
            HealthState::Other(v) => write!(f, "other({v:?})"),
        }
    }
}

/// Decode a health state from a `state=` value and a `healthcheck=` counter.
pub fn decode(state: Option<&str>, counter: Option<(&str, i64)>) -> HealthState {
    let counter_of = |expected: &str| match counter {
        Some((kind, value)) if kind == expected && value >= 0 => {
            u32::try_from(value).unwrap_or(u32::MAX)
        }
        _ => 0,
    };

    match state {
        None => HealthState::Unreachable(0),
        Some(STATE_ACTIVE) => HealthState::Active(counter_of(COUNTER_FAILING)),
        Some(STATE_UNREACHABLE) => HealthState::Unreachable(counter_of(COUNTER_PASSING)),
        Some(other) => HealthState::Other(other.to_string()),
    }
}

/// Decode the health state carried by a raw tag set.
pub fn decode_tags(tags: &BTreeSet<String>) -> HealthState {
    let parsed = HealthTags::parse(tags);
    decode(parsed.state.as_deref(), parsed.counter_pair())
}

/// Rewrite `existing` so that it carries `health`.
///
/// Tags other than `state=` and `healthcheck=` are preserved verbatim.
pub fn encode(existing: &BTreeSet<String>, health: &HealthState) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = existing
        .iter()
        .filter(|t| !tags::is_state_tag(t) && !tags::is_healthcheck_tag(t))
        .cloned()
        .collect();

    match health {
        HealthState::Active(n) => {
            tags.insert(tags::state_tag(STATE_ACTIVE));
            if *n > 0 {
                tags.insert(tags::healthcheck_tag(COUNTER_FAILING, *n));
            }
        }
        HealthState::Unreachable(n) => {
            tags.insert(tags::state_tag(STATE_UNREACHABLE));
            if *n > 0 {
                tags.insert(tags::healthcheck_tag(COUNTER_PASSING, *n));
            }
        }
        HealthState::Other(v) if v.is_empty() => {}
        HealthState::Other(v) => {
            tags.insert(tags::state_tag(v));
        }
    }
    tags
}

/// Compute the state following one probe outcome.
pub fn next_state(
    current: &HealthState,
    probe_succeeded: bool,
    active_threshold: u32,
    inactive_threshold: u32,
) -> HealthState {
    match (current, probe_succeeded) {
        (HealthState::Active(_), true) => HealthState::Active(0),
        (HealthState::Active(n), false) => {
            let failures = n.saturating_add(1);
            if failures >= inactive_threshold {
                HealthState::Unreachable(0)
            } else {
                HealthState::Active(failures)
            }
        }
        (HealthState::Unreachable(n), true) => {
            let successes = n.saturating_add(1);
            if successes >= active_threshold {
                HealthState::Active(0)
            } else {
                HealthState::Unreachable(successes)
            }
        }
        (HealthState::Unreachable(_), false) => HealthState::Unreachable(0),
        (other @ HealthState::Other(_), _) => other.clone(),
    }
}
