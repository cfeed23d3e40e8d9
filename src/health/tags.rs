//! Tag grammar shared with the live routing path.
//!
//! # Grammar
//! ```text
//! lbGroup=<name>                  load-balancing group membership
//! state=<value>                   active | unreachable | <administrative>
//! healthcheck=failing:<n>         only with state=active, n > 0
//! healthcheck=passing:<n>         only with state=unreachable, n > 0
//! created:<anything>              creation metadata, never rewritten
//! ```
//!
//! # Design Decisions
//! - Tags stay plain strings on the wire; `HealthTags` is the typed view
//! - Parsing never fails: malformed values are carried as-is or ignored

use std::collections::BTreeSet;

pub const LB_GROUP_PREFIX: &str = "lbGroup=";
pub const STATE_PREFIX: &str = "state=";
pub const HEALTHCHECK_PREFIX: &str = "healthcheck=";
pub const CREATED_PREFIX: &str = "created:";

pub const STATE_ACTIVE: &str = "active";
pub const STATE_UNREACHABLE: &str = "unreachable";
pub const STATE_CLOSED: &str = "closed";

pub const COUNTER_FAILING: &str = "failing";
pub const COUNTER_PASSING: &str = "passing";

/// Build the group membership tag for `group`.
pub fn lb_group_tag(group: &str) -> String {
    format!("{LB_GROUP_PREFIX}{group}")
}

pub fn state_tag(value: &str) -> String {
    format!("{STATE_PREFIX}{value}")
}

pub fn healthcheck_tag(kind: &str, count: u32) -> String {
    format!("{HEALTHCHECK_PREFIX}{kind}:{count}")
}

pub fn is_state_tag(tag: &str) -> bool {
    tag.starts_with(STATE_PREFIX)
}

pub fn is_healthcheck_tag(tag: &str) -> bool {
    tag.starts_with(HEALTHCHECK_PREFIX)
}

pub fn is_created_tag(tag: &str) -> bool {
    tag.starts_with(CREATED_PREFIX)
}

/// True if `tags` places the object in load-balancing group `group`.
pub fn in_group(tags: &BTreeSet<String>, group: &str) -> bool {
    tags.iter()
        .filter_map(|t| t.strip_prefix(LB_GROUP_PREFIX))
        .any(|g| g == group)
}

/// Counter carried by a `healthcheck=<kind>:<count>` tag.
///
/// `count` is `None` when the value does not parse as an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCounter {
    pub kind: String,
    pub count: Option<i64>,
}

/// Typed view over an object's tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthTags {
    /// Value of the `state=` tag, if any.
    pub state: Option<String>,
    /// Parsed `healthcheck=` tag, if any.
    pub counter: Option<HealthCounter>,
    /// Every other tag, creation metadata included.
    pub other: BTreeSet<String>,
}

impl HealthTags {
    /// Split a raw tag set into its health fields and the untouched remainder.
    ///
    /// If several `state=` or `healthcheck=` tags are present the
    /// lexicographically first one wins.
    pub fn parse(tags: &BTreeSet<String>) -> Self {
        let mut parsed = HealthTags::default();
        for tag in tags {
            if let Some(value) = tag.strip_prefix(STATE_PREFIX) {
                if parsed.state.is_none() {
                    parsed.state = Some(value.to_string());
                }
            } else if let Some(value) = tag.strip_prefix(HEALTHCHECK_PREFIX) {
                if parsed.counter.is_none() {
                    parsed.counter = parse_counter(value);
                }
            } else {
                parsed.other.insert(tag.clone());
            }
        }
        parsed
    }

    /// Render back to the wire format.
    pub fn render(&self) -> BTreeSet<String> {
        let mut tags = self.other.clone();
        if let Some(state) = &self.state {
            tags.insert(state_tag(state));
        }
        if let Some(HealthCounter { kind, count: Some(count) }) = &self.counter {
            tags.insert(format!("{HEALTHCHECK_PREFIX}{kind}:{count}"));
        }
        tags
    }

    /// The counter as a `(kind, value)` pair, malformed values reading as 0.
    pub fn counter_pair(&self) -> Option<(&str, i64)> {
        self.counter
            .as_ref()
            .map(|c| (c.kind.as_str(), c.count.unwrap_or(0)))
    }
}

fn parse_counter(value: &str) -> Option<HealthCounter> {
    let (kind, count) = value.split_once(':')?;
    Some(HealthCounter {
        kind: kind.to_string(),
        count: count.trim().parse().ok(),
    })
}
