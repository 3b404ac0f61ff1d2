//! # SRM Asset Cache Worker
//!
//! The client-side caching component of the SRM registry, modelled as a
//! single-threaded reactive state machine with four named transitions:
//!
//! - **install** — stage and commit the app shell into a versioned cache,
//!   all-or-nothing
//! - **activate** — prune caches from older versions and claim all pages
//! - **fetch** — network-first interception for non-API requests
//! - **message** — external control (skip waiting)
//!
//! Each transition is an async method; the future it returns is the pending
//! work handle the host must await before considering the transition
//! complete. The worker takes `&mut self` for every transition, so events
//! are handled one at a time by construction.
//!
//! API requests (paths under `/api/`) are never intercepted or cached.

pub mod cache;
pub mod fetch;
pub mod worker;

pub use cache::{Cache, CacheStorage};
pub use fetch::{FetchOutcome, Network, Request, Response};
pub use worker::{
    AssetCacheWorker, ClientPage, Clients, ControlMessage, EventOutcome, WorkerEvent, WorkerState,
    API_PREFIX, APP_SHELL, CACHE_NAME, OFFLINE_PAGE,
};

use thiserror::Error;

/// Errors that can occur in worker operations.
#[derive(Debug, Clone, Error)]
pub enum WorkerError {
    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("State error: {0}")]
    State(String),
}
