pub mod memory;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{BoosterEntity, BoosterId, NewBoosterEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for boosters.
///
/// Every query that depends on expiry receives `now` from the caller so the
/// process [`Clock`](crate::clock::Clock) stays the single source of time.
/// Owner matching is case-insensitive.
pub trait BoosterStore: Send + Sync {
    /// Insert a pending booster and return its assigned id.
    fn create_booster(
        &self,
        booster: NewBoosterEntity,
    ) -> BoxFuture<'static, StorageResult<BoosterId>>;
    /// Row with this id, pending or not.
    fn find_booster(
        &self,
        id: BoosterId,
    ) -> BoxFuture<'static, StorageResult<Option<BoosterEntity>>>;
    /// Pending boosters plus activated boosters whose window covers `now`.
    fn non_expired_boosters(
        &self,
        owner: &str,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<BoosterEntity>>>;
    /// First activated, unexpired booster for `scope`.
    fn active_booster_for(
        &self,
        scope: &str,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Option<BoosterEntity>>>;
    /// Every activated, unexpired row. Duplicate scopes are returned as-is.
    fn all_active_boosters(
        &self,
        now: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<BoosterEntity>>>;
    /// Unconditionally stamp `activated_at` on the row.
    fn mark_activated(&self, id: BoosterId, at: i64) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection in place.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
