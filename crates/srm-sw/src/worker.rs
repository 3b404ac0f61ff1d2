//! Worker lifecycle state machine

use crate::cache::{Cache, CacheStorage};
use crate::fetch::{FetchOutcome, Network, Request, Response};
use crate::WorkerError;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Cache name for the current worker version. Bumping the suffix invalidates
/// everything cached by earlier versions on the next activation.
pub const CACHE_NAME: &str = "srm-cache-v1";

/// Requests under this prefix are never intercepted or cached.
pub const API_PREFIX: &str = "/api/";

/// Served when both the network and the cache miss.
pub const OFFLINE_PAGE: &str = "/offline.html";

/// Fixed asset shell pre-cached at install. The offline page is part of the
/// shell so the fetch fallback can always find it.
pub const APP_SHELL: &[&str] = &[
    "/",
    "/index.html",
    "/dashboard.html",
    "/offline.html",
    "/favicon.ico",
    "/favicon-32x32.png",
    "/favicon-16x16.png",
    "/apple-touch-icon.png",
    "/android-chrome-192x192.png",
    "/android-chrome-512x512.png",
    "/site.webmanifest",
];

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkerState {
    /// Registered, no transition run yet.
    #[default]
    Parsed,
    /// Install transition in progress.
    Installing,
    /// Shell committed, waiting for activation.
    Installed,
    /// Activate transition in progress.
    Activating,
    /// Controlling pages.
    Activated,
    /// Install failed; this version will never serve anything.
    Redundant,
}

/// External control messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Activate immediately instead of waiting for open pages to close.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

/// One lifecycle event. The host delivers these one at a time.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(ControlMessage),
}

/// What an event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Done,
    Fetch(FetchOutcome),
}

/// A page this worker may control.
#[derive(Debug, Clone)]
pub struct ClientPage {
    pub id: String,
    pub url: Url,
    pub controlled: bool,
}

/// Registry of pages under the worker's scope.
#[derive(Debug, Clone, Default)]
pub struct Clients {
    pages: HashMap<String, ClientPage>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str, url: Url) {
        self.pages.insert(
            id.to_string(),
            ClientPage {
                id: id.to_string(),
                url,
                controlled: false,
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&ClientPage> {
        self.pages.get(id)
    }

    /// Take control of every page immediately, no reload required.
    pub fn claim(&mut self) -> usize {
        let mut claimed = 0;
        for page in self.pages.values_mut() {
            if !page.controlled {
                page.controlled = true;
                claimed += 1;
            }
        }
        claimed
    }

    pub fn all_controlled(&self) -> bool {
        self.pages.values().all(|p| p.controlled)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// The asset cache worker.
///
/// Network-first, cache-as-fallback: freshness wins while the network is up,
/// availability is preserved when it is not.
pub struct AssetCacheWorker<N: Network> {
    origin: Url,
    cache_name: String,
    shell: Vec<String>,
    network: N,
    caches: CacheStorage,
    clients: Clients,
    state: WorkerState,
    skip_waiting: bool,
}

impl<N: Network> AssetCacheWorker<N> {
    pub fn new(origin: Url, network: N) -> Self {
        Self {
            origin,
            cache_name: CACHE_NAME.to_string(),
            shell: APP_SHELL.iter().map(|s| s.to_string()).collect(),
            network,
            caches: CacheStorage::new(),
            clients: Clients::new(),
            state: WorkerState::Parsed,
            skip_waiting: false,
        }
    }

    /// Override the cache version, for upgrade scenarios.
    pub fn with_cache_name(mut self, name: &str) -> Self {
        self.cache_name = name.to_string();
        self
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn caches_mut(&mut self) -> &mut CacheStorage {
        &mut self.caches
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn clients_mut(&mut self) -> &mut Clients {
        &mut self.clients
    }

    /// Single entry point for the host: dispatch one event, await its
    /// pending work.
    pub async fn on_event(&mut self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => self.install().await.map(|_| EventOutcome::Done),
            WorkerEvent::Activate => self.activate().await.map(|_| EventOutcome::Done),
            WorkerEvent::Fetch(request) => {
                self.handle_fetch(request).await.map(EventOutcome::Fetch)
            }
            WorkerEvent::Message(message) => {
                self.handle_message(message).await.map(|_| EventOutcome::Done)
            }
        }
    }

    /// Install transition: fetch the whole shell into a staged cache and
    /// commit it only if every asset succeeded. Any failure is fatal for
    /// this version and leaves the cache store untouched.
    pub async fn install(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Parsed {
            return Err(WorkerError::State(format!(
                "install from {:?}",
                self.state
            )));
        }
        self.state = WorkerState::Installing;
        tracing::info!("Installing asset cache worker ({})", self.cache_name);

        let mut staged = Cache::new(&self.cache_name);
        for path in self.shell.clone() {
            let request = self.shell_request(&path)?;
            let response = match self.network.fetch(&request).await {
                Ok(response) if response.is_ok() => response,
                Ok(response) => {
                    self.state = WorkerState::Redundant;
                    return Err(WorkerError::InstallFailed(format!(
                        "{path}: status {}",
                        response.status
                    )));
                }
                Err(e) => {
                    self.state = WorkerState::Redundant;
                    return Err(WorkerError::InstallFailed(format!("{path}: {e}")));
                }
            };
            staged.put(&request, response);
        }

        tracing::info!("Cached {} shell assets", staged.len());
        self.caches.insert(staged);
        self.state = WorkerState::Installed;
        Ok(())
    }

    /// Activate transition: drop every cache from other versions, then claim
    /// all pages immediately.
    pub async fn activate(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Installed {
            return Err(WorkerError::State(format!(
                "activate from {:?}",
                self.state
            )));
        }
        self.state = WorkerState::Activating;

        let stale: Vec<String> = self
            .caches
            .keys()
            .into_iter()
            .filter(|name| *name != self.cache_name)
            .collect();
        for name in stale {
            tracing::info!("Deleting stale cache: {}", name);
            self.caches.delete(&name);
        }

        let claimed = self.clients.claim();
        tracing::info!("Activated, claimed {} page(s)", claimed);

        self.state = WorkerState::Activated;
        Ok(())
    }

    /// Fetch transition. API paths pass through; everything else is
    /// network-first with cache fallback, then the offline page, then a
    /// synthesized network error.
    pub async fn handle_fetch(&mut self, request: Request) -> Result<FetchOutcome, WorkerError> {
        if request.path().starts_with(API_PREFIX) {
            return Ok(FetchOutcome::Passthrough);
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                // Store a copy, return the original
                self.caches
                    .open(&self.cache_name)
                    .put(&request, response.clone());
                Ok(FetchOutcome::Response(response))
            }
            Err(e) => {
                tracing::debug!("Network failed for {}: {}, trying cache", request.path(), e);

                if let Some(hit) = self.caches.match_in(&self.cache_name, &request) {
                    let mut response = hit.clone();
                    response.from_cache = true;
                    return Ok(FetchOutcome::Response(response));
                }

                let offline = self.shell_request(OFFLINE_PAGE)?;
                if let Some(page) = self.caches.match_in(&self.cache_name, &offline) {
                    let mut response = page.clone();
                    response.from_cache = true;
                    return Ok(FetchOutcome::Response(response));
                }

                Ok(FetchOutcome::Response(Response::network_error()))
            }
        }
    }

    /// Message transition. `SkipWaiting` activates an installed worker on
    /// the spot; received earlier, it is remembered and honored right after
    /// install completes.
    pub async fn handle_message(&mut self, message: ControlMessage) -> Result<(), WorkerError> {
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting = true;
                if self.state == WorkerState::Installed {
                    self.activate().await?;
                }
                Ok(())
            }
        }
    }

    /// Whether a skip-waiting request is pending.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    fn shell_request(&self, path: &str) -> Result<Request, WorkerError> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| WorkerError::InvalidUrl(format!("{path}: {e}")))?;
        Ok(Request { url })
    }
}
