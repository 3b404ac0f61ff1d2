//! Fetch types and the network seam

use crate::WorkerError;
use async_trait::async_trait;
use hashbrown::HashMap;
use std::sync::Arc;
use url::Url;

/// An outgoing request as seen by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    pub url: Url,
}

impl Request {
    pub fn get(url: &str) -> Result<Self, WorkerError> {
        let url = Url::parse(url).map_err(|e| WorkerError::InvalidUrl(e.to_string()))?;
        Ok(Self { url })
    }

    /// Path component, used for API-prefix interception decisions.
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// A response, either fresh from the network or replayed from cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub from_cache: bool,
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: body.into(),
            from_cache: false,
        }
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
            from_cache: false,
        }
    }

    /// Synthesized response for a request nothing could serve: network down,
    /// no cached entry, no offline page.
    pub fn network_error() -> Self {
        Self {
            status: 0,
            headers: HashMap::new(),
            body: Vec::new(),
            from_cache: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of running a request through the fetch transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker does not intervene; the host issues the request untouched.
    Passthrough,
    /// The worker produced a response (network, cache, or offline page).
    Response(Response),
}

/// The worker's only way to reach the network. Injected so the caching
/// policy is testable against scripted outages.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, WorkerError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, WorkerError> {
        (**self).fetch(request).await
    }
}
