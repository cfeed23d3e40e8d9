//! HTTP routing object forwarding to a single origin.
//!
//! # Responsibilities
//! - Hold the origin base URL and a pooled HTTP client
//! - Forward the request path and headers to the origin
//! - Report the response status, or a transport error
//!
//! # Design Decisions
//! - No timeout of its own: callers wrap `handle` in theirs
//! - Response bodies are discarded, only the status matters here

use async_trait::async_trait;
use url::Url;

use crate::routing::object::{LiveRequest, LiveResponse, RoutingError, RoutingObject};

/// Proxies requests to one origin host.
#[derive(Debug, Clone)]
pub struct HostProxy {
    origin: Url,
    client: reqwest::Client,
}

impl HostProxy {
    /// Build a proxy for `host`, given as `host:port` or a full base URL.
    pub fn new(host: &str) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RoutingError::Transport(e.to_string()))?;
        Ok(Self::with_client(parse_origin(host)?, client))
    }

    pub fn with_client(origin: Url, client: reqwest::Client) -> Self {
        Self { origin, client }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

/// Parse an origin address, defaulting the scheme to `http`.
pub fn parse_origin(host: &str) -> Result<Url, RoutingError> {
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| RoutingError::InvalidRequest(format!("bad origin '{host}': {e}")))?;
    if url.host_str().is_none() {
        return Err(RoutingError::InvalidRequest(format!("origin '{host}' has no host")));
    }
    Ok(url)
}

#[async_trait]
impl RoutingObject for HostProxy {
    async fn handle(&self, request: LiveRequest) -> Result<LiveResponse, RoutingError> {
        let url = self
            .origin
            .join(&request.path)
            .map_err(|e| RoutingError::InvalidRequest(e.to_string()))?;

        let mut builder = self.client.request(request.method, url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;

        Ok(LiveResponse {
            status: response.status().as_u16(),
        })
    }
}
