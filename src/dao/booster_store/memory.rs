//! Process-local booster store used for local development and tests.
//!
//! Rows live in a vector guarded by an async lock. The store can be toggled
//! offline and slowed down so callers can exercise degraded and slow paths.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::{sync::RwLock, time::sleep};

use crate::dao::{
    booster_store::BoosterStore,
    models::{BoosterEntity, BoosterId, NewBoosterEntity, is_live_at, player_key},
    storage::{StorageError, StorageResult},
};

/// Failures raised by the in-memory store.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// Toggled offline with [`MemoryBoosterStore::set_offline`].
    #[error("memory store is offline")]
    Offline,
}

/// In-memory [`BoosterStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryBoosterStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rows: RwLock<Vec<BoosterEntity>>,
    next_id: AtomicU64,
    offline: AtomicBool,
    latency_ms: AtomicU64,
    player_queries: AtomicUsize,
}

impl MemoryBoosterStore {
    /// Create an empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.inner
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `non_expired_boosters` queries served so far.
    pub fn player_queries(&self) -> usize {
        self.inner.player_queries.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> StorageResult<()> {
        let latency = self.inner.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            sleep(Duration::from_millis(latency)).await;
        }
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "memory store offline".into(),
                MemoryStoreError::Offline,
            ));
        }
        Ok(())
    }

    async fn create_booster(&self, booster: NewBoosterEntity) -> StorageResult<BoosterId> {
        self.enter().await?;
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) as BoosterId + 1;
        self.inner.rows.write().await.push(booster.into_entity(id));
        Ok(id)
    }

    async fn find_booster(&self, id: BoosterId) -> StorageResult<Option<BoosterEntity>> {
        self.enter().await?;
        let rows = self.inner.rows.read().await;
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn non_expired_boosters(
        &self,
        key: String,
        now: i64,
    ) -> StorageResult<Vec<BoosterEntity>> {
        self.inner.player_queries.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        let rows = self.inner.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| player_key(&row.player) == key)
            .filter(|row| row.activated_at.is_none() || is_live_at(row, now))
            .cloned()
            .collect())
    }

    async fn active_rows(
        &self,
        scope: Option<String>,
        now: i64,
    ) -> StorageResult<Vec<BoosterEntity>> {
        self.enter().await?;
        let rows = self.inner.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| scope.as_deref().is_none_or(|scope| row.scope == scope))
            .filter(|row| is_live_at(row, now))
            .cloned()
            .collect())
    }

    async fn mark_activated(&self, id: BoosterId, at: i64) -> StorageResult<()> {
        self.enter().await?;
        let mut rows = self.inner.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
            row.activated_at = Some(at);
        }
        Ok(())
    }
}

impl BoosterStore for MemoryBoosterStore {
    fn create_booster(
        &self,
        booster: NewBoosterEntity,
    ) -> BoxFuture<'static, StorageResult<BoosterId>> {
        let store = self.clone();
        Box::pin(async move { store.create_booster(booster).await })
    }

    fn find_booster(
        &self,
        id: BoosterId,
    ) -> BoxFuture<'static, StorageResult<Option<BoosterEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_booster(id).await })
    }

    fn non_expired_boosters(
        &self,
        owner: &str,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<BoosterEntity>>> {
        let store = self.clone();
        let key = player_key(owner);
        Box::pin(async move { store.non_expired_boosters(key, now).await })
    }

    fn active_booster_for(
        &self,
        scope: &str,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Option<BoosterEntity>>> {
        let store = self.clone();
        let scope = scope.to_owned();
        Box::pin(async move {
            let rows = store.active_rows(Some(scope), now).await?;
            Ok(rows.into_iter().next())
        })
    }

    fn all_active_boosters(
        &self,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<BoosterEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.active_rows(None, now).await })
    }

    fn mark_activated(&self, id: BoosterId, at: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.mark_activated(id, at).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.enter().await })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.enter().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create(store: &MemoryBoosterStore, player: &str, scope: &str) -> BoosterId {
        let booster = NewBoosterEntity {
            player: player.into(),
            scope: scope.into(),
            multiplier: 3,
            duration_millis: 60_000,
        };
        BoosterStore::create_booster(store, booster).await.unwrap()
    }

    async fn active_id(store: &MemoryBoosterStore, scope: &str, now: i64) -> Option<BoosterId> {
        let row = BoosterStore::active_booster_for(store, scope, now)
            .await
            .unwrap();
        row.map(|row| row.id)
    }

    #[tokio::test]
    async fn non_expired_includes_pending_and_live_rows_only() {
        let store = MemoryBoosterStore::new();
        let pending = create(&store, "Alice", "sky_wars").await;
        let live = create(&store, "Alice", "bed_wars").await;
        let expired = create(&store, "alice", "walls").await;
        BoosterStore::mark_activated(&store, live, 1_000)
            .await
            .unwrap();
        BoosterStore::mark_activated(&store, expired, -100_000)
            .await
            .unwrap();

        let rows = BoosterStore::non_expired_boosters(&store, "ALICE", 2_000)
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![pending, live]);
    }

    #[tokio::test]
    async fn active_lookup_ignores_pending_and_expired() {
        let store = MemoryBoosterStore::new();
        let id = create(&store, "Alice", "sky_wars").await;
        assert_eq!(active_id(&store, "sky_wars", 0).await, None);

        BoosterStore::mark_activated(&store, id, 0).await.unwrap();
        assert_eq!(active_id(&store, "sky_wars", 59_999).await, Some(id));
        assert_eq!(active_id(&store, "sky_wars", 60_000).await, None);
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryBoosterStore::new();
        store.set_offline(true);
        let err = BoosterStore::all_active_boosters(&store, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
