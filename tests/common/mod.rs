//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use origin_health::health::tags::lb_group_tag;
use origin_health::registry::{ObjectStore, RoutingObjectRecord};
use origin_health::routing::{LiveRequest, LiveResponse, RoutingError, RoutingObject};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Routing object answering with a fixed status and recording probe paths.
#[derive(Default)]
pub struct Recording {
    status: u16,
    paths: Mutex<Vec<String>>,
}

impl Recording {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            paths: Mutex::new(Vec::new()),
        })
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.paths.lock().unwrap().len()
    }
}

#[async_trait]
impl RoutingObject for Recording {
    async fn handle(&self, request: LiveRequest) -> Result<LiveResponse, RoutingError> {
        self.paths.lock().unwrap().push(request.path);
        Ok(LiveResponse { status: self.status })
    }
}

/// Routing object whose every call fails at the transport level.
#[derive(Default)]
pub struct Failing {
    calls: AtomicUsize,
}

impl Failing {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingObject for Failing {
    async fn handle(&self, _request: LiveRequest) -> Result<LiveResponse, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RoutingError::Transport("connection refused".into()))
    }
}

/// Routing object that waits before answering.
pub struct Slow {
    pub delay: Duration,
    pub status: u16,
    pub started: tokio::sync::Notify,
}

impl Slow {
    pub fn new(delay: Duration, status: u16) -> Arc<Self> {
        Arc::new(Self {
            delay,
            status,
            started: tokio::sync::Notify::new(),
        })
    }
}

#[async_trait]
impl RoutingObject for Slow {
    async fn handle(&self, _request: LiveRequest) -> Result<LiveResponse, RoutingError> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        Ok(LiveResponse { status: self.status })
    }
}

/// Routing object that runs a side effect against the store before answering.
pub struct Meddling<F> {
    pub store: Arc<ObjectStore>,
    pub effect: F,
}

#[async_trait]
impl<F> RoutingObject for Meddling<F>
where
    F: Fn(&ObjectStore) + Send + Sync,
{
    async fn handle(&self, _request: LiveRequest) -> Result<LiveResponse, RoutingError> {
        (self.effect)(&self.store);
        Ok(LiveResponse { status: 200 })
    }
}

/// Register `name` in group `group` with the given extra tags.
pub fn record(
    store: &ObjectStore,
    name: &str,
    group: &str,
    tags: &[&str],
    handler: Arc<dyn RoutingObject>,
) {
    let mut all = vec![lb_group_tag(group)];
    all.extend(tags.iter().map(|t| t.to_string()));
    store
        .put(RoutingObjectRecord::new(name, "X", all, json!({}), handler))
        .unwrap();
}

pub fn tags_of(store: &ObjectStore, name: &str) -> BTreeSet<String> {
    store.get(name).unwrap().tags.clone()
}

/// Only the `state=` and `healthcheck=` tags of `name`.
pub fn health_tags_of(store: &ObjectStore, name: &str) -> Vec<String> {
    tags_of(store, name)
        .into_iter()
        .filter(|t| t.starts_with("state=") || t.starts_with("healthcheck="))
        .collect()
}

pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn eventually<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` receives the request path and returns the status to answer with.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = u16> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        let path = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        let status = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_text
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that always answers with `status`.
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move |_| async move { status }).await
}
