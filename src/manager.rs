//! The offline resource cache manager.
//!
//! This module implements the lifecycle and fetch-interception logic:
//!
//! - `handle_install`: atomically populate the static generation from the
//!   configured manifest (fail-closed: a partially cached shell never
//!   becomes the active shell)
//! - `handle_activate`: delete superseded generations, take over, and
//!   broadcast an `UpdateNotice` to connected clients
//! - `handle_fetch`: classify the request and run its caching strategy
//!
//! Cache writes that follow a network success are detached tasks; the
//! response path never waits for them. Failures inside detached writes are
//! logged and discarded.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::fetch::{Fetch, FetchError};
use crate::models::{Request, ResponseSnapshot};
use crate::notify::UpdateNotice;
use crate::routing::{GenerationName, RouteTable, Strategy};
use crate::store::{CacheEntry, CacheStore};

/// Buffer size for the client notification channel.
/// Notifications are rare (one per deploy), so a small buffer suffices.
const NOTIFY_CHANNEL_CAPACITY: usize = 16;

/// Failure of a single fetch interception.
#[derive(Error, Debug)]
pub enum InterceptError {
    /// Network failure that no cache fallback could recover.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Environment-level store failure. The host should degrade to an
    /// uncontrolled network request, as if no manager were present.
    #[error("Cache store failure: {0}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for InterceptError {
    fn from(err: anyhow::Error) -> Self {
        InterceptError::Store(err)
    }
}

/// Result of intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The manager handled the request and produced this response.
    Response(ResponseSnapshot),
    /// Non-GET or non-http(s) request; pass through unmodified.
    Bypass,
}

/// Lifecycle state of one deployed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Installing,
    Active { version: String },
    Superseded,
}

pub struct CacheManager<S, F> {
    store: Arc<S>,
    fetcher: Arc<F>,
    config: ManagerConfig,
    routes: RouteTable,
    state: Mutex<LifecycleState>,
    notifier: tokio::sync::broadcast::Sender<UpdateNotice>,
}

impl<S, F> CacheManager<S, F>
where
    S: CacheStore + 'static,
    F: Fetch + 'static,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>, config: ManagerConfig) -> Self {
        let routes = RouteTable::new(&config);
        let (notifier, _) = tokio::sync::broadcast::channel(NOTIFY_CHANNEL_CAPACITY);
        Self {
            store,
            fetcher,
            config,
            routes,
            state: Mutex::new(LifecycleState::Installing),
            notifier,
        }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn state(&self) -> LifecycleState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe a presentation context to update notifications.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<UpdateNotice> {
        self.notifier.subscribe()
    }

    /// Full store name of one of this version's generations.
    pub fn generation_name(&self, generation: GenerationName) -> String {
        format!(
            "{}-{}-{}",
            self.config.cache_prefix,
            generation.as_str(),
            self.config.version
        )
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Populate the static generation from the install manifest.
    ///
    /// All manifest resources are fetched before anything is stored, and a
    /// single failed or non-2xx fetch fails the install with the store
    /// untouched. The previously active version keeps serving.
    pub async fn handle_install(&self) -> Result<(), InterceptError> {
        let version = self.version();
        debug!(version, "install: populating static generation");

        let mut requests = Vec::with_capacity(self.config.manifest.len());
        for path in &self.config.manifest {
            let url = self
                .config
                .manifest_url(path)
                .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
            requests.push(Request::get(url));
        }

        let fetches = requests.iter().map(|request| self.fetcher.fetch(request));
        let responses = try_join_all(fetches).await.map_err(InterceptError::Fetch)?;

        for (request, response) in requests.iter().zip(&responses) {
            if !response.is_success() {
                return Err(InterceptError::Fetch(FetchError::BadStatus {
                    url: request.key(),
                    status: response.status,
                }));
            }
        }

        let generation = self.generation_name(GenerationName::Static);
        self.store.open(&generation).await?;
        for (request, response) in requests.iter().zip(responses) {
            self.store
                .write(&generation, &request.key(), CacheEntry::new(response))
                .await?;
        }

        info!(version, "install: static generation populated");
        Ok(())
    }

    /// Supersede older versions: delete stale generations, ensure this
    /// version's generations exist, take control, and notify clients.
    ///
    /// Must only be called after a successful `handle_install`.
    pub async fn handle_activate(&self) -> Result<(), InterceptError> {
        let version = self.version().to_string();
        let current: Vec<String> = GenerationName::ALL
            .iter()
            .map(|generation| self.generation_name(*generation))
            .collect();

        // Best-effort cleanup: one stubborn stale generation must not block
        // the others, nor block activation.
        let existing = self.store.list().await?;
        for name in existing.iter().filter(|name| !current.contains(name)) {
            match self.store.delete(name).await {
                Ok(_) => debug!(generation = %name, "activate: deleted stale generation"),
                Err(e) => {
                    warn!(generation = %name, error = %e, "activate: failed to delete stale generation")
                }
            }
        }

        for name in &current {
            self.store.open(name).await?;
        }

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = LifecycleState::Active {
            version: version.clone(),
        };

        if self.notifier.send(UpdateNotice::new(&version)).is_err() {
            debug!("activate: no connected clients to notify");
        }

        info!(version = %version, "activate: version is now active");
        Ok(())
    }

    /// Mark this version as replaced by a newer activation.
    pub fn supersede(&self) {
        info!(version = self.version(), "superseded by a newer version");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = LifecycleState::Superseded;
    }

    // =========================================================================
    // Fetch interception
    // =========================================================================

    /// Intercept one outbound request.
    ///
    /// Non-GET and non-http(s) requests bypass the manager entirely.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, InterceptError> {
        if request.method != reqwest::Method::GET {
            return Ok(FetchOutcome::Bypass);
        }
        if !matches!(request.url.scheme(), "http" | "https") {
            return Ok(FetchOutcome::Bypass);
        }

        let route = self.routes.classify(request);
        debug!(class = ?route.class, url = %request.url, "fetch: intercepted");

        match route.strategy {
            Strategy::NetworkFirst { offline_fallback } => {
                self.network_first(request, route.generation, offline_fallback)
                    .await
            }
            Strategy::CacheFirstRevalidate => self.cache_first(request, route.generation).await,
        }
    }

    async fn network_first(
        &self,
        request: &Request,
        generation: GenerationName,
        offline_fallback: bool,
    ) -> Result<FetchOutcome, InterceptError> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.spawn_write(generation, request.key(), response.clone());
                Ok(FetchOutcome::Response(response))
            }
            Err(err) => {
                debug!(url = %request.url, error = %err, "fetch: network failed, trying cache");
                if let Some(entry) = self.lookup_any(&request.key()).await? {
                    return Ok(FetchOutcome::Response(entry.response));
                }
                if offline_fallback {
                    return Ok(FetchOutcome::Response(ResponseSnapshot::offline()));
                }
                Err(InterceptError::Fetch(err))
            }
        }
    }

    async fn cache_first(
        &self,
        request: &Request,
        generation: GenerationName,
    ) -> Result<FetchOutcome, InterceptError> {
        let name = self.generation_name(generation);
        if let Some(entry) = self.store.read(&name, &request.key()).await? {
            debug!(
                url = %request.url,
                age_minutes = entry.age_minutes(),
                "fetch: serving cached asset, revalidating in background"
            );
            self.spawn_revalidate(generation, request.clone());
            return Ok(FetchOutcome::Response(entry.response));
        }

        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(InterceptError::Fetch)?;
        if response.is_success() {
            self.spawn_write(generation, request.key(), response.clone());
        }
        Ok(FetchOutcome::Response(response))
    }

    /// Look a key up across every generation in the store, oldest name
    /// first. Used for network-first fallback, mirroring a match against
    /// the whole cache rather than a single generation.
    async fn lookup_any(&self, key: &str) -> Result<Option<CacheEntry>, InterceptError> {
        for generation in self.store.list().await? {
            if let Some(entry) = self.store.read(&generation, key).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Detached cache write. The spawned task owns the result; failures are
    /// logged and never reach the in-flight response.
    fn spawn_write(&self, generation: GenerationName, key: String, response: ResponseSnapshot) {
        let store = Arc::clone(&self.store);
        let name = self.generation_name(generation);
        tokio::spawn(async move {
            if let Err(e) = write_entry(store.as_ref(), &name, &key, response).await {
                warn!(generation = %name, key = %key, error = %e, "background cache write failed");
            }
        });
    }

    /// Detached revalidation of a cached asset. Only a 2xx response
    /// overwrites the entry; the response already returned to the caller is
    /// unaffected either way.
    fn spawn_revalidate(&self, generation: GenerationName, request: Request) {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let name = self.generation_name(generation);
        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    if let Err(e) =
                        write_entry(store.as_ref(), &name, &request.key(), response).await
                    {
                        warn!(generation = %name, url = %request.url, error = %e, "revalidation write failed");
                    }
                }
                Ok(response) => {
                    debug!(url = %request.url, status = response.status, "revalidation returned non-success, keeping cached copy");
                }
                Err(e) => {
                    debug!(url = %request.url, error = %e, "revalidation fetch failed, keeping cached copy");
                }
            }
        });
    }
}

async fn write_entry<S: CacheStore>(
    store: &S,
    generation: &str,
    key: &str,
    response: ResponseSnapshot,
) -> anyhow::Result<()> {
    store.open(generation).await?;
    store.write(generation, key, CacheEntry::new(response)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct NoNetwork;

    impl Fetch for NoNetwork {
        async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, FetchError> {
            Err(FetchError::Network(format!("unreachable: {}", request.url)))
        }
    }

    fn manager(version: &str) -> CacheManager<MemoryStore, NoNetwork> {
        CacheManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NoNetwork),
            ManagerConfig::new(version),
        )
    }

    #[test]
    fn test_generation_names_carry_prefix_and_version() {
        let manager = manager("v3");
        assert_eq!(
            manager.generation_name(GenerationName::Static),
            "muslim-guide-static-v3"
        );
        assert_eq!(
            manager.generation_name(GenerationName::Runtime),
            "muslim-guide-runtime-v3"
        );
    }

    #[tokio::test]
    async fn test_new_manager_starts_installing() {
        let manager = manager("v1");
        assert_eq!(manager.state(), LifecycleState::Installing);
        manager.supersede();
        assert_eq!(manager.state(), LifecycleState::Superseded);
    }

    #[tokio::test]
    async fn test_non_get_bypasses() {
        let manager = manager("v1");
        let mut request = Request::get(reqwest::Url::parse("http://localhost:5173/").unwrap());
        request.method = reqwest::Method::POST;
        let outcome = manager.handle_fetch(&request).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Bypass);
    }

    #[tokio::test]
    async fn test_non_http_scheme_bypasses() {
        let manager = manager("v1");
        let request =
            Request::get(reqwest::Url::parse("chrome-extension://abcdef/popup.html").unwrap());
        let outcome = manager.handle_fetch(&request).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Bypass);
    }
}
