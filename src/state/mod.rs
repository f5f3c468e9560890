pub mod booster;
pub mod player_cache;
pub mod registry;
/// Scopes accepting activations in this process.
pub mod scopes;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    clock::{EpochMillis, SharedClock},
    config::AppConfig,
    dao::booster_store::BoosterStore,
    error::ServiceError,
};

use self::{
    player_cache::PlayerBoosterCache, registry::ActiveBoosterRegistry, scopes::ScopeRegistry,
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the storage handle plus the in-memory views derived from it.
pub struct AppState {
    booster_store: RwLock<Option<Arc<dyn BoosterStore>>>,
    degraded: watch::Sender<bool>,
    registry: ActiveBoosterRegistry,
    cache: Arc<PlayerBoosterCache>,
    scopes: ScopeRegistry,
    config: AppConfig,
    clock: SharedClock,
    activation_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, clock: SharedClock) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let cache = PlayerBoosterCache::new(
            config.cache_ttl(),
            config.slow_load_notice(),
            clock.clone(),
        );
        Arc::new(Self {
            booster_store: RwLock::new(None),
            degraded: degraded_tx,
            registry: ActiveBoosterRegistry::new(),
            cache,
            scopes: ScopeRegistry::new(),
            config,
            clock,
            activation_gate: Mutex::new(()),
        })
    }

    /// Obtain a handle to the current booster store, if one is installed.
    pub async fn booster_store(&self) -> Option<Arc<dyn BoosterStore>> {
        let guard = self.booster_store.read().await;
        guard.as_ref().cloned()
    }

    /// Store handle for operations that cannot run without storage.
    pub async fn require_booster_store(&self) -> Result<Arc<dyn BoosterStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.booster_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new booster store implementation and leave degraded mode.
    pub async fn install_booster_store(&self, store: Arc<dyn BoosterStore>) {
        {
            let mut guard = self.booster_store.write().await;
            *guard = Some(store);
        }
        self.set_degraded(false);
    }

    /// Remove the current booster store and enter degraded mode.
    pub async fn clear_booster_store(&self) {
        {
            let mut guard = self.booster_store.write().await;
            guard.take();
        }
        self.set_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn set_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Process-local view of the active booster per scope.
    pub fn registry(&self) -> &ActiveBoosterRegistry {
        &self.registry
    }

    /// Per-player booster listings.
    pub fn cache(&self) -> &Arc<PlayerBoosterCache> {
        &self.cache
    }

    /// Scopes this process accepts activations for.
    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current time according to the process clock.
    pub fn now(&self) -> EpochMillis {
        self.clock.now_millis()
    }

    /// Serialises activations issued by this process.
    pub fn activation_gate(&self) -> &Mutex<()> {
        &self.activation_gate
    }
}
