//! Component loader: cache, in-flight deduplication and failure tracking

use crate::error::{LoaderError, Result};
use crate::loader::{
    config::LoaderConfig,
    entry::CacheEntry,
    failure::FailureRecord,
    registry::{ModuleLoaderFn, ModuleRegistry},
    types::{GameDescriptor, GameId, LoadState, LoaderStats},
};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Load outcome shared by every caller waiting on the same attempt
type SharedLoad<C> = Shared<BoxFuture<'static, Result<Arc<C>>>>;

/// Lazy loader for game components.
///
/// This implementation provides:
/// - A fresh-for-TTL cache of loaded components
/// - One shared load per identifier, whatever the number of callers
/// - Per-identifier failure tracking with a retry ceiling
///
/// Clones are cheap and share the same state.
pub struct ComponentLoader<C> {
    config: Arc<LoaderConfig>,

    /// Allow-list of loadable modules
    registry: Arc<ModuleRegistry<C>>,

    /// Internal storage
    state: Arc<RwLock<LoaderState<C>>>,
}

impl<C> Clone for ComponentLoader<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            state: Arc::clone(&self.state),
        }
    }
}

/// Internal loader storage
struct LoaderState<C> {
    /// Loaded components: id -> entry
    entries: HashMap<GameId, CacheEntry<C>>,

    /// Loads that have started but not settled
    in_flight: HashMap<GameId, InFlightLoad<C>>,

    /// Failure records since the last success
    failures: HashMap<GameId, FailureRecord>,

    stats: LoaderStats,
}

struct InFlightLoad<C> {
    /// Settlement only touches the maps while this is still the current attempt
    attempt: Uuid,
    handle: SharedLoad<C>,
}

enum Lookup<C> {
    Ready(Arc<C>),
    Pending(SharedLoad<C>),
}

impl<C> LoaderState<C> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            failures: HashMap::new(),
            stats: LoaderStats::default(),
        }
    }

    /// Record a failure and return the updated retry count
    fn record_failure(&mut self, id: &str, error: LoaderError) -> u32 {
        match self.failures.get_mut(id) {
            Some(record) => {
                record.record(error);
                record.retry_count
            }
            None => {
                self.failures
                    .insert(id.to_string(), FailureRecord::new(id.to_string(), error));
                1
            }
        }
    }

    fn evict_expired(&mut self, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(ttl));
        let evicted = before - self.entries.len();
        self.stats.evictions_ttl += evicted as u64;
        evicted
    }

    fn settle(&mut self, id: &str, attempt: Uuid, outcome: &Result<Arc<C>>) {
        if self.in_flight.get(id).map(|load| load.attempt) != Some(attempt) {
            debug!("Discarding result of superseded load {} for {}", attempt, id);
            return;
        }
        self.in_flight.remove(id);

        match outcome {
            Ok(artifact) => {
                self.entries.insert(
                    id.to_string(),
                    CacheEntry::new(id.to_string(), Arc::clone(artifact)),
                );
                if self.failures.remove(id).is_some() {
                    debug!("Cleared failure record for {}", id);
                }
                info!("Loaded game component: {}", id);
            }
            Err(e) => {
                let retry_count = self.record_failure(id, e.clone());
                warn!("Failed to load {} (failure #{}): {}", id, retry_count, e);
            }
        }
    }
}

impl<C: Send + Sync + 'static> ComponentLoader<C> {
    /// Create a loader with the default configuration
    pub fn new(registry: ModuleRegistry<C>) -> Self {
        Self::build(registry, LoaderConfig::default())
    }

    /// Create a loader with a custom configuration
    pub fn with_config(registry: ModuleRegistry<C>, config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(registry, config))
    }

    fn build(registry: ModuleRegistry<C>, config: LoaderConfig) -> Self {
        info!(
            "Initializing component loader with {} modules, config: {:?}",
            registry.len(),
            config
        );

        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            state: Arc::new(RwLock::new(LoaderState::new())),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry<C> {
        &self.registry
    }

    /// Return the game's component, loading it if needed.
    ///
    /// A fresh cache entry is returned without waiting on a load, though
    /// the lookup itself takes the state write lock and may wait behind
    /// other callers holding it. Otherwise the caller joins the in-flight
    /// load for this game, or starts one.
    pub async fn load_game(&self, game: &GameDescriptor) -> Result<Arc<C>> {
        let lookup = {
            let mut state = self.state.write().await;
            self.lookup(&mut state, game)?
        };

        match lookup {
            Lookup::Ready(artifact) => Ok(artifact),
            Lookup::Pending(load) => load.await,
        }
    }

    /// Drop any cached or in-flight load for the game and load it again.
    ///
    /// Refused with [`LoaderError::MaxRetriesExceeded`] once the retry
    /// ceiling has been reached, and with the recorded error when the
    /// failure is not retryable.
    pub async fn retry_load(&self, game: &GameDescriptor) -> Result<Arc<C>> {
        let lookup = {
            let mut state = self.state.write().await;

            if let Some(record) = state.failures.get(&game.id) {
                if !record.can_retry(self.config.max_retries) {
                    warn!(
                        "Refusing retry for {} after {} failures",
                        game.id, record.retry_count
                    );
                    return Err(record.refusal());
                }
            }

            state.entries.remove(&game.id);
            if let Some(load) = state.in_flight.remove(&game.id) {
                debug!("Dropping in-flight load {} for {} before retry", load.attempt, game.id);
            }

            self.lookup(&mut state, game)?
        };

        match lookup {
            Lookup::Ready(artifact) => Ok(artifact),
            Lookup::Pending(load) => load.await,
        }
    }

    /// Start loading the game in the background.
    ///
    /// The returned handle may be dropped; a failure is still logged and
    /// recorded in the failure tracker.
    pub fn preload_game(&self, game: &GameDescriptor) -> PreloadHandle<C> {
        let loader = self.clone();
        let game = game.clone();
        let identifier = game.id.clone();

        debug!("Preloading {}", identifier);
        let task = tokio::spawn(async move {
            let outcome = loader.load_game(&game).await;
            if let Err(e) = &outcome {
                warn!("Preload of {} failed: {}", game.id, e);
            }
            outcome
        });

        PreloadHandle { identifier, task }
    }

    /// Check whether a fresh component is cached
    pub async fn is_loaded(&self, id: &str) -> bool {
        let state = self.state.read().await;
        state
            .entries
            .get(id)
            .map_or(false, |entry| entry.is_fresh(self.config.ttl))
    }

    /// Check whether a load is in flight
    pub async fn is_loading(&self, id: &str) -> bool {
        let state = self.state.read().await;
        state.in_flight.contains_key(id)
    }

    /// Get the current failure record, if any
    pub async fn get_load_error(&self, id: &str) -> Option<FailureRecord> {
        let state = self.state.read().await;
        state.failures.get(id).cloned()
    }

    /// Check whether another attempt would be allowed
    pub async fn can_retry(&self, id: &str) -> bool {
        let state = self.state.read().await;
        state
            .failures
            .get(id)
            .map_or(true, |record| record.can_retry(self.config.max_retries))
    }

    /// Derive the load state of a game from the loader's maps
    pub async fn load_state(&self, id: &str) -> LoadState {
        let state = self.state.read().await;

        if state.in_flight.contains_key(id) {
            return LoadState::Loading;
        }
        if let Some(entry) = state.entries.get(id) {
            return if entry.is_fresh(self.config.ttl) {
                LoadState::Loaded
            } else {
                LoadState::Stale
            };
        }
        match state.failures.get(id) {
            Some(record) if record.can_retry(self.config.max_retries) => LoadState::Failed {
                retry_count: record.retry_count,
            },
            Some(_) => LoadState::Exhausted,
            None => LoadState::Unloaded,
        }
    }

    /// Get loader statistics
    pub async fn get_cache_stats(&self) -> LoaderStats {
        let state = self.state.read().await;
        LoaderStats {
            cached: state.entries.len(),
            loading: state.in_flight.len(),
            failed: state.failures.len(),
            ..state.stats.clone()
        }
    }

    /// Clear state for one game, or for every game when `id` is `None`.
    ///
    /// Loads still running for a cleared game complete for their callers
    /// but no longer write to the cache.
    pub async fn clear_cache(&self, id: Option<&str>) {
        let mut state = self.state.write().await;

        match id {
            Some(id) => {
                state.entries.remove(id);
                state.in_flight.remove(id);
                state.failures.remove(id);
                info!("Cleared loader state for {}", id);
            }
            None => {
                info!(
                    "Cleared {} cached, {} in-flight and {} failed entries",
                    state.entries.len(),
                    state.in_flight.len(),
                    state.failures.len()
                );
                state.entries.clear();
                state.in_flight.clear();
                state.failures.clear();
            }
        }
    }

    /// Tear down all loader state
    pub async fn destroy(&self) {
        self.clear_cache(None).await;
    }

    /// Remove all stale entries
    pub async fn evict_expired(&self) -> usize {
        let mut state = self.state.write().await;
        let evicted = state.evict_expired(self.config.ttl);
        if evicted > 0 {
            debug!("Evicted {} stale components", evicted);
        }
        evicted
    }

    /// Spawn the background sweep if enabled in the configuration
    pub fn spawn_auto_cleanup(&self) -> Option<JoinHandle<()>> {
        if !self.config.enable_auto_cleanup {
            return None;
        }
        Some(tokio::spawn(start_auto_cleanup(self.clone())))
    }

    fn lookup(&self, state: &mut LoaderState<C>, game: &GameDescriptor) -> Result<Lookup<C>> {
        let id = &game.id;

        if let Some(entry) = state.entries.get(id) {
            if entry.is_fresh(self.config.ttl) {
                let artifact = Arc::clone(&entry.artifact);
                state.stats.hits += 1;
                debug!("Cache hit: {}", id);
                return Ok(Lookup::Ready(artifact));
            }

            debug!("Cache entry expired: {}", id);
            state.entries.remove(id);
            state.stats.evictions_ttl += 1;
        }

        state.stats.misses += 1;

        if let Some(load) = state.in_flight.get(id) {
            debug!("Joining in-flight load {} for {}", load.attempt, id);
            let handle = load.handle.clone();
            state.stats.deduplicated += 1;
            return Ok(Lookup::Pending(handle));
        }

        if let Some(record) = state.failures.get(id) {
            if !record.can_retry(self.config.max_retries) {
                warn!("Refusing load for {} after {} failures", id, record.retry_count);
                return Err(record.refusal());
            }
        }

        let Some(loader) = self.registry.resolve(&game.module_path) else {
            let error = LoaderError::UnknownModulePath {
                module_path: game.module_path.clone(),
            };
            warn!("Cannot load {}: {}", id, error);
            state.record_failure(id, error.clone());
            return Err(error);
        };

        let attempt = Uuid::new_v4();
        debug!("Starting load {} for {} ({})", attempt, id, game.module_path);

        let handle = self.spawn_load(game, attempt, loader);
        state.in_flight.insert(
            id.clone(),
            InFlightLoad {
                attempt,
                handle: handle.clone(),
            },
        );
        state.stats.loads_started += 1;

        Ok(Lookup::Pending(handle))
    }

    /// Run the loader on its own task so it completes even if every caller
    /// goes away, then settle the maps before any waiter is released.
    fn spawn_load(
        &self,
        game: &GameDescriptor,
        attempt: Uuid,
        loader: ModuleLoaderFn<C>,
    ) -> SharedLoad<C> {
        let state = Arc::clone(&self.state);
        let id = game.id.clone();
        let module_path = game.module_path.clone();

        let task = tokio::spawn({
            let module_path = module_path.clone();
            async move {
                let outcome = run_loader(&module_path, loader).await;
                state.write().await.settle(&id, attempt, &outcome);
                outcome
            }
        });

        task.map(move |joined| {
            joined.unwrap_or_else(|e| {
                Err(LoaderError::UnderlyingLoadFailure {
                    module_path,
                    message: format!("load task aborted: {}", e),
                })
            })
        })
        .boxed()
        .shared()
    }
}

async fn run_loader<C>(module_path: &str, loader: ModuleLoaderFn<C>) -> Result<Arc<C>> {
    let module = match AssertUnwindSafe(async move { loader().await })
        .catch_unwind()
        .await
    {
        Ok(Ok(module)) => module,
        Ok(Err(e)) => return Err(LoaderError::load_failure(module_path, &e)),
        Err(panic) => {
            return Err(LoaderError::UnderlyingLoadFailure {
                module_path: module_path.to_string(),
                message: format!("loader panicked: {}", panic_message(&*panic)),
            })
        }
    };

    module
        .into_default()
        .ok_or_else(|| LoaderError::MissingDefaultExport {
            module_path: module_path.to_string(),
        })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Handle to a background preload.
///
/// Dropping it detaches the load; it still runs to completion.
pub struct PreloadHandle<C> {
    identifier: GameId,
    task: JoinHandle<Result<Arc<C>>>,
}

impl<C> PreloadHandle<C> {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the preload and return its outcome
    pub async fn outcome(self) -> Result<Arc<C>> {
        self.task
            .await
            .unwrap_or_else(|e| Err(LoaderError::Other(format!("preload task failed: {}", e))))
    }
}

/// Background task for sweeping stale components.
///
/// Exits once every clone of the loader has been dropped.
pub async fn start_auto_cleanup<C: Send + Sync + 'static>(loader: ComponentLoader<C>) {
    let interval = loader.config.cleanup_interval;
    let ttl = loader.config.ttl;
    let state: Weak<RwLock<LoaderState<C>>> = Arc::downgrade(&loader.state);
    drop(loader);

    info!("Starting automatic loader cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let Some(state) = state.upgrade() else {
            debug!("Loader dropped, stopping cleanup task");
            break;
        };

        let evicted = state.write().await.evict_expired(ttl);
        if evicted > 0 {
            debug!("Auto cleanup: evicted {} stale components", evicted);
        }
    }
}
