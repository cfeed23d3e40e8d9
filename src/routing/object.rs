//! Live handler contract.

use async_trait::async_trait;
use reqwest::Method;
use thiserror::Error;

/// Failures a handler reports instead of a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request could not be turned into a backend call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Request handed to a routing object.
#[derive(Debug, Clone)]
pub struct LiveRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl LiveRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// What came back from the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveResponse {
    pub status: u16,
}

/// Anything the registry can route traffic to.
#[async_trait]
pub trait RoutingObject: Send + Sync {
    async fn handle(&self, request: LiveRequest) -> Result<LiveResponse, RoutingError>;
}

/// Answers every request with a fixed status.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    status: u16,
}

impl StaticResponse {
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

#[async_trait]
impl RoutingObject for StaticResponse {
    async fn handle(&self, _request: LiveRequest) -> Result<LiveResponse, RoutingError> {
        Ok(LiveResponse { status: self.status })
    }
}
