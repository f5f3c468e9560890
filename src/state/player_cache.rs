//! Per-player cache of non-expired boosters with bounded staleness.
//!
//! Entries are keyed by the lower-cased player name. A load for a given player
//! is issued at most once at a time: callers arriving while a load is in
//! flight get [`BoosterListing::AlreadyLoading`] and no result. The store
//! fetch runs on its own task so it completes (and populates the cache) even
//! if the requesting caller goes away.
//!
//! Each player carries a generation bumped by [`PlayerBoosterCache::invalidate`].
//! A load only stores its result if the generation it started under is still
//! current, so a list read before an activation never lands after it.

use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, DashSet};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    clock::{EpochMillis, SharedClock},
    dao::{
        booster_store::BoosterStore,
        models::{BoosterId, player_key},
    },
    error::ServiceError,
    state::booster::{Booster, BoosterStatus, from_entities},
};

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoosterListing {
    /// The player's pending and active boosters.
    Ready(Vec<Booster>),
    /// Another caller is already loading this player's boosters.
    AlreadyLoading,
}

struct CacheEntry {
    boosters: Vec<Booster>,
    fetched_at: EpochMillis,
}

/// Clears the loading marker however the load ends.
struct LoadingGuard {
    cache: Arc<PlayerBoosterCache>,
    key: String,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.cache.loading.remove(&self.key);
    }
}

/// TTL cache of each player's non-expired boosters.
pub struct PlayerBoosterCache {
    entries: DashMap<String, CacheEntry>,
    loading: DashSet<String>,
    generations: DashMap<String, u64>,
    ttl_millis: i64,
    slow_load_notice: Duration,
    clock: SharedClock,
}

impl PlayerBoosterCache {
    /// Empty cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration, slow_load_notice: Duration, clock: SharedClock) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            loading: DashSet::new(),
            generations: DashMap::new(),
            ttl_millis: ttl.as_millis() as i64,
            slow_load_notice,
            clock,
        })
    }

    /// Return the player's non-expired boosters, loading them from `store` on a miss.
    ///
    /// `on_slow_load` runs on a background task if the store has not answered
    /// within the slow-load delay; it is cancelled otherwise. A failed load
    /// leaves any previous entry in place. A load overtaken by
    /// [`invalidate`](Self::invalidate) still returns its list but does not cache it.
    pub async fn get<F>(
        self: &Arc<Self>,
        store: Arc<dyn BoosterStore>,
        player: &str,
        on_slow_load: F,
    ) -> Result<BoosterListing, ServiceError>
    where
        F: FnOnce() + Send + 'static,
    {
        let key = player_key(player);
        if self.loading.contains(&key) {
            return Ok(BoosterListing::AlreadyLoading);
        }

        let now = self.clock.now_millis();
        if let Some(boosters) = self.fresh_pruned(&key, now) {
            return Ok(BoosterListing::Ready(boosters));
        }

        if !self.loading.insert(key.clone()) {
            return Ok(BoosterListing::AlreadyLoading);
        }
        let guard = LoadingGuard {
            cache: Arc::clone(self),
            key: key.clone(),
        };
        let generation = *self.generations.entry(key.clone()).or_insert(0);

        let delay = self.slow_load_notice;
        let notice = tokio::spawn(async move {
            sleep(delay).await;
            on_slow_load();
        });

        let cache = Arc::clone(self);
        let owner = player.to_owned();
        let load = tokio::spawn(async move {
            let _guard = guard;
            let result = store
                .non_expired_boosters(&owner, now)
                .await
                .and_then(from_entities);
            notice.abort();

            match &result {
                Ok(boosters) => {
                    if cache.store_if_current(key, generation, boosters, now) {
                        debug!(player = %owner, count = boosters.len(), "cached player boosters");
                    } else {
                        debug!(player = %owner, "discarded player boosters invalidated mid-load");
                    }
                }
                Err(err) => warn!(player = %owner, error = %err, "failed to load player boosters"),
            }
            result
        });

        match load.await {
            Ok(result) => Ok(BoosterListing::Ready(result?)),
            Err(err) => Err(ServiceError::Internal(format!(
                "booster load task failed: {err}"
            ))),
        }
    }

    /// Insert a loaded list unless `key` was invalidated since `generation` was read.
    fn store_if_current(
        &self,
        key: String,
        generation: u64,
        boosters: &[Booster],
        fetched_at: EpochMillis,
    ) -> bool {
        // Held across the insert so a concurrent invalidate waits for it.
        let current = self.generations.get(&key);
        if current.as_deref() != Some(&generation) {
            return false;
        }
        let entry = CacheEntry {
            boosters: boosters.to_vec(),
            fetched_at,
        };
        self.entries.insert(key, entry);
        true
    }

    /// Fresh entry with expired boosters pruned in place.
    fn fresh_pruned(&self, key: &str, now: EpochMillis) -> Option<Vec<Booster>> {
        let mut entry = self.entries.get_mut(key)?;
        if now - entry.fetched_at > self.ttl_millis {
            return None;
        }
        entry
            .boosters
            .retain(|booster| booster.status(now) != BoosterStatus::Expired);
        Some(entry.boosters.clone())
    }

    /// Drop the cached entry for `player` (case-insensitive) and discard any
    /// load in flight for them. Returns whether an entry was removed.
    pub fn invalidate(&self, player: &str) -> bool {
        let key = player_key(player);
        *self.generations.entry(key.clone()).or_insert(0) += 1;
        self.entries.remove(&key).is_some()
    }

    /// Disconnect hook: release everything held for `player`.
    pub fn forget(&self, player: &str) {
        if self.invalidate(player) {
            debug!(player, "released cached boosters of disconnected player");
        }
    }

    /// Reflect an activation in every cached list containing `id`, keeping freshness.
    ///
    /// Lists still being loaded are not covered; pair with
    /// [`invalidate`](Self::invalidate) for the owner.
    pub fn update_activation(&self, id: BoosterId, activated_at: EpochMillis) -> usize {
        let mut updated = 0;
        for mut entry in self.entries.iter_mut() {
            for booster in entry.boosters.iter_mut().filter(|booster| booster.id == id) {
                booster.mark_activated(activated_at);
                updated += 1;
            }
        }
        updated
    }

    /// Evict entries older than the TTL. Returns how many were removed.
    ///
    /// Generations of players with no load in flight are dropped as well.
    pub fn purge_stale(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now - entry.fetched_at <= self.ttl_millis);
        self.generations
            .retain(|key, _| self.loading.contains(key));
        before.saturating_sub(self.entries.len())
    }

    /// Cached list for `player` as stored, ignoring freshness.
    pub fn cached(&self, player: &str) -> Option<Vec<Booster>> {
        self.entries
            .get(&player_key(player))
            .map(|entry| entry.boosters.clone())
    }

    /// Whether a load for `player` is in flight.
    pub fn is_loading(&self, player: &str) -> bool {
        self.loading.contains(&player_key(player))
    }

    /// Number of cached players, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no player is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::{
        clock::ManualClock,
        dao::{booster_store::memory::MemoryBoosterStore, models::NewBoosterEntity},
    };

    const TTL: Duration = Duration::from_secs(30);
    const NOTICE: Duration = Duration::from_millis(250);

    async fn seeded_store() -> MemoryBoosterStore {
        let store = MemoryBoosterStore::new();
        for scope in ["sky_wars", "walls"] {
            BoosterStore::create_booster(
                &store,
                NewBoosterEntity {
                    player: "PlayerX".into(),
                    scope: scope.into(),
                    multiplier: 2,
                    duration_millis: 60_000,
                },
            )
            .await
            .unwrap();
        }
        store
    }

    fn ready(listing: BoosterListing) -> Vec<Booster> {
        match listing {
            BoosterListing::Ready(boosters) => boosters,
            BoosterListing::AlreadyLoading => panic!("expected a ready listing"),
        }
    }

    #[tokio::test]
    async fn serves_from_cache_within_ttl_and_reloads_after() {
        let clock = ManualClock::new(0);
        let store = seeded_store().await;
        let cache = PlayerBoosterCache::new(TTL, NOTICE, clock.clone());
        let shared: Arc<dyn BoosterStore> = Arc::new(store.clone());

        let first = ready(cache.get(shared.clone(), "PlayerX", || {}).await.unwrap());
        assert_eq!(first.len(), 2);
        assert_eq!(store.player_queries(), 1);

        clock.set(10_000);
        let second = ready(cache.get(shared.clone(), "playerx", || {}).await.unwrap());
        assert_eq!(second, first);
        assert_eq!(store.player_queries(), 1);

        clock.set(40_000);
        ready(cache.get(shared, "PlayerX", || {}).await.unwrap());
        assert_eq!(store.player_queries(), 2);
    }

    #[tokio::test]
    async fn cached_hits_prune_expired_boosters() {
        let clock = ManualClock::new(0);
        let store = seeded_store().await;
        BoosterStore::mark_activated(&store, 1, 0).await.unwrap();
        let cache = PlayerBoosterCache::new(Duration::from_secs(120), NOTICE, clock.clone());
        let shared: Arc<dyn BoosterStore> = Arc::new(store);

        let listing = ready(cache.get(shared.clone(), "PlayerX", || {}).await.unwrap());
        assert_eq!(listing.len(), 2);

        clock.set(60_000);
        let pruned = ready(cache.get(shared, "PlayerX", || {}).await.unwrap());
        assert_eq!(pruned.iter().map(|b| b.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(cache.cached("PlayerX").unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_deduplicated() {
        let clock = ManualClock::new(0);
        let store = seeded_store().await;
        store.set_latency(Duration::from_millis(50));
        let cache = PlayerBoosterCache::new(TTL, NOTICE, clock);
        let shared: Arc<dyn BoosterStore> = Arc::new(store.clone());

        let (first, second) = tokio::join!(
            cache.get(shared.clone(), "PlayerX", || {}),
            cache.get(shared.clone(), "PLAYERX", || {}),
        );

        assert_eq!(ready(first.unwrap()).len(), 2);
        assert_eq!(second.unwrap(), BoosterListing::AlreadyLoading);
        assert_eq!(store.player_queries(), 1);
        assert!(!cache.is_loading("PlayerX"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_loads_trigger_the_notice() {
        let store = seeded_store().await;
        store.set_latency(Duration::from_secs(1));
        let cache = PlayerBoosterCache::new(TTL, NOTICE, ManualClock::new(0));
        let fired = Arc::new(AtomicBool::new(false));

        let flag = fired.clone();
        let on_slow_load = move || flag.store(true, Ordering::SeqCst);
        let listing = cache
            .get(Arc::new(store), "PlayerX", on_slow_load)
            .await
            .unwrap();

        assert_eq!(ready(listing).len(), 2);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_loads_cancel_the_notice() {
        let store = seeded_store().await;
        let cache = PlayerBoosterCache::new(TTL, NOTICE, ManualClock::new(0));
        let fired = Arc::new(AtomicBool::new(false));

        let flag = fired.clone();
        let on_slow_load = move || flag.store(true, Ordering::SeqCst);
        cache
            .get(Arc::new(store), "PlayerX", on_slow_load)
            .await
            .unwrap();
        sleep(Duration::from_secs(1)).await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_entry() {
        let clock = ManualClock::new(0);
        let store = seeded_store().await;
        let cache = PlayerBoosterCache::new(TTL, NOTICE, clock.clone());
        let shared: Arc<dyn BoosterStore> = Arc::new(store.clone());
        ready(cache.get(shared.clone(), "PlayerX", || {}).await.unwrap());

        clock.set(40_000);
        store.set_offline(true);
        let err = cache.get(shared, "PlayerX", || {}).await.unwrap_err();

        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(cache.cached("PlayerX").map(|b| b.len()), Some(2));
        assert!(!cache.is_loading("PlayerX"));
    }

    #[tokio::test]
    async fn invalidate_is_case_insensitive_and_idempotent() {
        let store = seeded_store().await;
        let cache = PlayerBoosterCache::new(TTL, NOTICE, ManualClock::new(0));
        ready(cache.get(Arc::new(store), "PlayerX", || {}).await.unwrap());

        assert!(cache.invalidate("PLAYERX"));
        assert!(!cache.invalidate("playerx"));
        assert!(!cache.invalidate("nobody"));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_during_a_load_keeps_its_result_out_of_the_cache() {
        let store = seeded_store().await;
        store.set_latency(Duration::from_millis(50));
        let cache = PlayerBoosterCache::new(TTL, NOTICE, ManualClock::new(0));
        let shared: Arc<dyn BoosterStore> = Arc::new(store.clone());

        let invalidate = async {
            sleep(Duration::from_millis(10)).await;
            assert!(cache.is_loading("PlayerX"));
            cache.invalidate("playerx")
        };
        let (listing, removed) = tokio::join!(
            cache.get(shared.clone(), "PlayerX", || {}),
            invalidate
        );

        assert!(!removed);
        assert_eq!(ready(listing.unwrap()).len(), 2);
        assert!(cache.cached("PlayerX").is_none());

        ready(cache.get(shared, "PlayerX", || {}).await.unwrap());
        assert_eq!(cache.cached("PlayerX").map(|b| b.len()), Some(2));
        assert_eq!(store.player_queries(), 2);
    }

    #[tokio::test]
    async fn purge_keeps_generations_of_loading_players_only() {
        let store = seeded_store().await;
        let cache = PlayerBoosterCache::new(TTL, NOTICE, ManualClock::new(0));
        cache.invalidate("Ghost");
        ready(cache.get(Arc::new(store), "PlayerX", || {}).await.unwrap());
        assert_eq!(cache.generations.len(), 2);

        cache.purge_stale();
        assert!(cache.generations.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn update_activation_patches_cached_lists_in_place() {
        let clock = ManualClock::new(0);
        let store = seeded_store().await;
        let cache = PlayerBoosterCache::new(TTL, NOTICE, clock.clone());
        let shared: Arc<dyn BoosterStore> = Arc::new(store.clone());
        ready(cache.get(shared.clone(), "PlayerX", || {}).await.unwrap());

        assert_eq!(cache.update_activation(2, 5_000), 1);
        clock.set(10_000);
        let listing = ready(cache.get(shared, "PlayerX", || {}).await.unwrap());

        let patched = listing.iter().find(|b| b.id == 2).unwrap();
        assert_eq!(patched.activated_at(), Some(5_000));
        assert_eq!(store.player_queries(), 1);
    }

    #[tokio::test]
    async fn purge_drops_entries_past_ttl() {
        let clock = ManualClock::new(0);
        let store = seeded_store().await;
        let cache = PlayerBoosterCache::new(TTL, NOTICE, clock.clone());
        ready(cache.get(Arc::new(store), "PlayerX", || {}).await.unwrap());

        assert_eq!(cache.purge_stale(), 0);
        clock.set(30_001);
        assert_eq!(cache.purge_stale(), 1);
        assert!(cache.is_empty());
    }
}
