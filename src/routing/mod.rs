//! Routing objects and the live read path.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ProxyConfig.applications
//!     → translator.rs (one HostProxy record per origin)
//!     → registry::ObjectStore
//!
//! Live request / probe:
//!     RoutingObjectRecord.handler (object.rs trait)
//!     → host_proxy.rs (forward to origin over HTTP)
//!     → LiveResponse { status } or RoutingError
//!
//! Origin selection:
//!     routable_origins(group) → snapshot → keep state=active
//! ```
//!
//! # Design Decisions
//! - Handlers are shared (`Arc`), the registry references them, never owns their lifecycle
//! - Status classification is the caller's job, handlers only report what happened
//! - Eligibility is read from tags on every call, nothing is cached

pub mod host_proxy;
pub mod object;
pub mod translator;

use std::sync::Arc;

use crate::health::tags::in_group;
use crate::registry::{ObjectStore, RoutingObjectRecord};

pub use host_proxy::HostProxy;
pub use object::{LiveRequest, LiveResponse, RoutingError, RoutingObject, StaticResponse};

/// Members of `group` that may currently receive traffic, ordered by name.
pub fn routable_origins(store: &ObjectStore, group: &str) -> Vec<Arc<RoutingObjectRecord>> {
    store
        .snapshot(|tags| in_group(tags, group))
        .into_iter()
        .filter(|record| record.health().is_routable())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn put(store: &ObjectStore, name: &str, tags: &[&str]) {
        store
            .put(RoutingObjectRecord::new(
                name,
                "StaticResponse",
                tags.iter().copied(),
                json!(null),
                Arc::new(StaticResponse::new(200)),
            ))
            .unwrap();
    }

    #[test]
    fn test_only_active_members_are_routable() {
        let store = ObjectStore::new();
        put(&store, "aaa-01", &["lbGroup=aaa"]);
        put(&store, "aaa-02", &["lbGroup=aaa", "state=active", "healthcheck=failing:1"]);
        put(&store, "aaa-03", &["lbGroup=aaa", "state=unreachable", "healthcheck=passing:1"]);
        put(&store, "aaa-04", &["lbGroup=aaa", "state=closed"]);
        put(&store, "aaa-05", &["lbGroup=aaa", "state=active"]);
        put(&store, "bbb-01", &["lbGroup=bbb", "state=active"]);

        let names: Vec<_> = routable_origins(&store, "aaa")
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["aaa-02", "aaa-05"]);
    }
}
