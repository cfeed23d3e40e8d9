//! Builds registry records from the application configuration.
//!
//! # Responsibilities
//! - One `HostProxy` record per configured origin, named `<app>.<origin>`
//! - Tag each record with its group, creation source and initial state
//!
//! # Design Decisions
//! - Every origin starts active, so a restart never empties a group; health
//!   checks demote origins that fail
//! - Record names are `<app>.<origin>`; ids may not contain `.`

use std::sync::Arc;

use crate::config::{ApplicationConfig, ProxyConfig};
use crate::health::tags::{lb_group_tag, state_tag, CREATED_PREFIX, STATE_ACTIVE};
use crate::registry::RoutingObjectRecord;
use crate::routing::host_proxy::HostProxy;
use crate::routing::object::RoutingError;

pub const HOST_PROXY_TYPE: &str = "HostProxy";
pub const CREATOR: &str = "origins-config";

/// Translate every application's origins into registry records.
pub fn routing_objects(config: &ProxyConfig) -> Result<Vec<RoutingObjectRecord>, RoutingError> {
    let mut records = Vec::new();
    for app in &config.applications {
        records.extend(application_objects(app)?);
    }
    Ok(records)
}

pub fn application_objects(app: &ApplicationConfig) -> Result<Vec<RoutingObjectRecord>, RoutingError> {
    app.origins
        .iter()
        .map(|origin| {
            let handler = HostProxy::new(&origin.host)?;
            let config = serde_json::to_value(origin)
                .map_err(|e| RoutingError::InvalidRequest(e.to_string()))?;
            Ok(RoutingObjectRecord::new(
                format!("{}.{}", app.id, origin.id),
                HOST_PROXY_TYPE,
                [
                    lb_group_tag(&app.id),
                    format!("{CREATED_PREFIX}{CREATOR}"),
                    state_tag(STATE_ACTIVE),
                ],
                config,
                Arc::new(handler),
            ))
        })
        .collect()
}
