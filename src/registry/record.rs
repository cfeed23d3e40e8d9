//! Registry entry type.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::health::state::{decode_tags, HealthState};
use crate::routing::RoutingObject;

/// A named routing object as published in the registry.
#[derive(Clone)]
pub struct RoutingObjectRecord {
    /// Unique key within the registry.
    pub name: String,
    /// Kind of object (e.g. `HostProxy`), informational only.
    pub object_type: String,
    /// Tag set; health tags are rewritten by the monitor.
    pub tags: BTreeSet<String>,
    /// Configuration owned by whoever built the object.
    pub config: Arc<Value>,
    /// Live handler used for traffic and probes.
    pub handler: Arc<dyn RoutingObject>,
    /// Bumped on every committed change, starting at 1.
    pub version: u64,
}

impl RoutingObjectRecord {
    pub fn new<I, S>(
        name: impl Into<String>,
        object_type: impl Into<String>,
        tags: I,
        config: Value,
        handler: Arc<dyn RoutingObject>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            config: Arc::new(config),
            handler,
            version: 1,
        }
    }

    /// Copy of this record carrying `tags`, one version later.
    pub fn with_tags(&self, tags: BTreeSet<String>) -> Self {
        Self {
            tags,
            version: self.version + 1,
            ..self.clone()
        }
    }

    /// Health state currently encoded in the tags.
    pub fn health(&self) -> HealthState {
        decode_tags(&self.tags)
    }
}

impl fmt::Debug for RoutingObjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingObjectRecord")
            .field("name", &self.name)
            .field("object_type", &self.object_type)
            .field("tags", &self.tags)
            .field("config", &self.config)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
