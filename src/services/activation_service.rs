//! Activation write path: precondition checks against the store, then the
//! persistent write followed by the in-memory registry and cache updates.
//!
//! Activations issued by this process are serialised by the state's
//! activation gate, so two local requests for the same scope cannot both pass
//! the "scope already active" check. Activations racing from other processes
//! sharing the store are only detected by the next reconciliation run.

use tracing::{debug, info};

use crate::{
    dao::models::BoosterId,
    error::ServiceError,
    state::{SharedState, booster::Booster},
};

/// Outcome of an activation request. Every variant but `Activated` is a normal rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationResult {
    /// The booster is now active; carries its updated state.
    Activated(Booster),
    /// No booster has this id.
    NotFound,
    /// The requester does not own the booster.
    NotOwner,
    /// The booster was activated before.
    AlreadyActivated,
    /// Activations are not accepted for the booster's scope here.
    ScopeNotRegistered,
    /// Another booster is active in the same scope.
    ScopeAlreadyActive,
}

impl ActivationResult {
    /// Whether the request activated the booster.
    pub fn is_activated(&self) -> bool {
        matches!(self, ActivationResult::Activated(_))
    }
}

/// Activate booster `id` on behalf of `requester`.
///
/// Checks short-circuit in order: existence, ownership, prior activation,
/// scope registration, then whether the scope already has an active booster.
/// Only store failures surface as errors.
pub async fn activate(
    state: &SharedState,
    requester: &str,
    id: BoosterId,
) -> Result<ActivationResult, ServiceError> {
    let store = state.require_booster_store().await?;
    let _gate = state.activation_gate().lock().await;

    let Some(entity) = store.find_booster(id).await? else {
        debug!(id, requester, "activation rejected: unknown booster");
        return Ok(ActivationResult::NotFound);
    };
    let mut booster = Booster::try_from(entity)?;

    if !booster.is_owned_by(requester) {
        debug!(id, requester, owner = %booster.owner, "activation rejected: not the owner");
        return Ok(ActivationResult::NotOwner);
    }
    if booster.was_activated() {
        return Ok(ActivationResult::AlreadyActivated);
    }
    if !state.scopes().contains(&booster.scope) {
        debug!(id, scope = %booster.scope, "activation rejected: scope not registered");
        return Ok(ActivationResult::ScopeNotRegistered);
    }

    let now = state.now();
    let occupied = store.active_booster_for(&booster.scope, now).await?;
    if occupied.is_some() {
        return Ok(ActivationResult::ScopeAlreadyActive);
    }

    store.mark_activated(id, now).await?;
    booster.mark_activated(now);

    // Patch every cached copy, then force the requester's listing to reload.
    // Invalidation also discards a listing load already in flight.
    state.cache().update_activation(id, now);
    state.cache().invalidate(requester);
    state.registry().put(booster.clone());

    info!(
        id,
        owner = %booster.owner,
        scope = %booster.scope,
        multiplier = booster.multiplier,
        duration_millis = booster.duration_millis,
        "booster activated"
    );
    Ok(ActivationResult::Activated(booster))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        clock::ManualClock,
        config::AppConfig,
        dao::{
            booster_store::{BoosterStore, memory::MemoryBoosterStore},
            models::NewBoosterEntity,
        },
        state::AppState,
    };

    async fn setup() -> (SharedState, MemoryBoosterStore, Arc<ManualClock>) {
        let clock = ManualClock::new(1_000);
        let state = AppState::new(AppConfig::default(), clock.clone());
        let store = MemoryBoosterStore::new();
        state.install_booster_store(Arc::new(store.clone())).await;
        state.scopes().register("sky_wars");
        (state, store, clock)
    }

    async fn grant(store: &MemoryBoosterStore, owner: &str) -> BoosterId {
        BoosterStore::create_booster(
            store,
            NewBoosterEntity {
                player: owner.into(),
                scope: "sky_wars".into(),
                multiplier: 3,
                duration_millis: 60_000,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn activation_publishes_to_registry_and_store() {
        let (state, store, _clock) = setup().await;
        let id = grant(&store, "Alice").await;
        assert!(
            BoosterStore::active_booster_for(&store, "sky_wars", 1_000)
                .await
                .unwrap()
                .is_none()
        );

        let result = activate(&state, "Alice", id).await.unwrap();
        let ActivationResult::Activated(booster) = result else {
            panic!("expected activation, got {result:?}");
        };
        assert_eq!(booster.activated_at(), Some(1_000));

        let active = BoosterStore::active_booster_for(&store, "sky_wars", 1_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((active.id, active.multiplier), (id, 3));
        assert_eq!(
            state.registry().lookup("sky_wars", 1_000).map(|b| b.id),
            Some(id)
        );
    }

    #[tokio::test]
    async fn second_activation_is_rejected() {
        let (state, store, _clock) = setup().await;
        let id = grant(&store, "Alice").await;
        assert!(activate(&state, "Alice", id).await.unwrap().is_activated());
        assert_eq!(
            activate(&state, "alice", id).await.unwrap(),
            ActivationResult::AlreadyActivated
        );
    }

    #[tokio::test]
    async fn only_the_owner_may_activate() {
        let (state, store, _clock) = setup().await;
        let id = grant(&store, "Alice").await;
        assert_eq!(
            activate(&state, "Bob", id).await.unwrap(),
            ActivationResult::NotOwner
        );
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    async fn scope_with_active_booster_rejects_another() {
        let (state, store, _clock) = setup().await;
        let first = grant(&store, "Alice").await;
        let second = grant(&store, "Bob").await;
        let result = activate(&state, "Alice", first).await.unwrap();
        assert!(result.is_activated());

        assert_eq!(
            activate(&state, "Bob", second).await.unwrap(),
            ActivationResult::ScopeAlreadyActive
        );
    }

    #[tokio::test]
    async fn scope_can_be_reused_once_the_window_ends() {
        let (state, store, clock) = setup().await;
        let first = grant(&store, "Alice").await;
        let second = grant(&store, "Bob").await;
        let result = activate(&state, "Alice", first).await.unwrap();
        assert!(result.is_activated());

        clock.advance(60_000);
        let result = activate(&state, "Bob", second).await.unwrap();
        assert!(result.is_activated());
    }

    #[tokio::test]
    async fn unknown_id_and_unregistered_scope_are_rejected() {
        let (state, store, _clock) = setup().await;
        assert_eq!(
            activate(&state, "Alice", 42).await.unwrap(),
            ActivationResult::NotFound
        );

        let id = grant(&store, "Alice").await;
        state.scopes().unregister("sky_wars");
        assert_eq!(
            activate(&state, "Alice", id).await.unwrap(),
            ActivationResult::ScopeNotRegistered
        );
    }

    #[tokio::test]
    async fn concurrent_local_activations_allow_one_winner() {
        let (state, store, _clock) = setup().await;
        let first = grant(&store, "Alice").await;
        let second = grant(&store, "Bob").await;

        let (a, b) = tokio::join!(
            activate(&state, "Alice", first),
            activate(&state, "Bob", second)
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        assert_eq!(outcomes.iter().filter(|r| r.is_activated()).count(), 1);
        assert!(outcomes.contains(&ActivationResult::ScopeAlreadyActive));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_error() {
        let (state, store, _clock) = setup().await;
        let id = grant(&store, "Alice").await;
        store.set_offline(true);
        assert!(matches!(
            activate(&state, "Alice", id).await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn activation_refreshes_cached_listings() {
        let (state, store, _clock) = setup().await;
        let id = grant(&store, "Alice").await;
        let shared: Arc<dyn BoosterStore> = Arc::new(store.clone());
        state.cache().get(shared, "Alice", || {}).await.unwrap();
        assert!(state.cache().cached("Alice").is_some());

        activate(&state, "ALICE", id).await.unwrap();
        assert!(state.cache().cached("Alice").is_none());
    }
}
