//! Read projections and the admin grant path. Activation lives in
//! [`activation_service`](crate::services::activation_service).

use tracing::{debug, info};

use crate::{
    dao::models::{BoosterId, NewBoosterEntity},
    dto::{
        booster::{
            ActiveBoosterSummary, BoosterStatusDto, BoosterSummary, GrantBoosterRequest,
            PlayerBoostersResponse, ScopeChangeResponse, ScopesResponse,
        },
        validation::validate_scope,
    },
    error::ServiceError,
    state::{
        SharedState,
        booster::{Booster, from_entities},
        player_cache::BoosterListing,
    },
};

/// Grant a pending booster after checking the configured bounds.
pub async fn grant(
    state: &SharedState,
    request: GrantBoosterRequest,
) -> Result<BoosterId, ServiceError> {
    let config = state.config();
    if !(config.min_multiplier..=config.max_multiplier).contains(&request.multiplier) {
        return Err(ServiceError::InvalidInput(format!(
            "multiplier must be between {} and {}, got {}",
            config.min_multiplier, config.max_multiplier, request.multiplier
        )));
    }
    if request.duration_millis <= 0 || request.duration_millis > config.max_duration_millis {
        return Err(ServiceError::InvalidInput(format!(
            "duration must be between 1 and {} ms, got {}",
            config.max_duration_millis, request.duration_millis
        )));
    }

    let store = state.require_booster_store().await?;
    let id = store
        .create_booster(NewBoosterEntity {
            player: request.player.clone(),
            scope: request.scope.clone(),
            multiplier: i32::from(request.multiplier),
            duration_millis: request.duration_millis,
        })
        .await?;
    state.cache().invalidate(&request.player);

    info!(
        id,
        player = %request.player,
        scope = %request.scope,
        multiplier = request.multiplier,
        duration_millis = request.duration_millis,
        "booster granted"
    );
    Ok(id)
}

/// A player's non-expired boosters through the cache, active ones first.
///
/// A second request arriving while the first is still loading is reported
/// as [`ServiceError::InvalidState`].
pub async fn player_boosters(
    state: &SharedState,
    player: &str,
) -> Result<PlayerBoostersResponse, ServiceError> {
    let store = state.require_booster_store().await?;
    let notice_player = player.to_owned();
    let listing = state
        .cache()
        .get(store, player, move || {
            info!(player = %notice_player, "booster listing is slow to load");
        })
        .await?;

    match listing {
        BoosterListing::Ready(boosters) => Ok(listing_response(state, player, &boosters)),
        BoosterListing::AlreadyLoading => Err(ServiceError::InvalidState(format!(
            "boosters of `{player}` are already loading"
        ))),
    }
}

/// A player's non-expired boosters read straight from the store.
pub async fn view_player_boosters(
    state: &SharedState,
    player: &str,
) -> Result<PlayerBoostersResponse, ServiceError> {
    let store = state.require_booster_store().await?;
    let rows = store.non_expired_boosters(player, state.now()).await?;
    let boosters = from_entities(rows)?;
    Ok(listing_response(state, player, &boosters))
}

fn listing_response(
    state: &SharedState,
    player: &str,
    boosters: &[Booster],
) -> PlayerBoostersResponse {
    let now = state.now();
    let mut summaries: Vec<BoosterSummary> = boosters
        .iter()
        .filter_map(|booster| {
            BoosterSummary::project(booster, now, state.scopes().contains(&booster.scope))
        })
        .collect();
    summaries.sort_by_key(|summary| summary.status != BoosterStatusDto::Active);

    PlayerBoostersResponse {
        player: player.to_owned(),
        boosters: summaries,
    }
}

/// Registry lookup for `scope`; never touches the store.
pub fn active_booster(
    state: &SharedState,
    scope: &str,
) -> Result<ActiveBoosterSummary, ServiceError> {
    let now = state.now();
    state
        .registry()
        .lookup(scope, now)
        .and_then(|booster| ActiveBoosterSummary::project(&booster, now))
        .ok_or_else(|| ServiceError::NotFound(format!("no active booster for scope `{scope}`")))
}

/// Every active booster known to the registry, ordered by scope.
pub fn active_boosters(state: &SharedState) -> Vec<ActiveBoosterSummary> {
    let now = state.now();
    state
        .registry()
        .snapshot(now)
        .iter()
        .filter_map(|booster| ActiveBoosterSummary::project(booster, now))
        .collect()
}

/// Scopes accepting activations, sorted.
pub fn list_scopes(state: &SharedState) -> ScopesResponse {
    ScopesResponse {
        scopes: state.scopes().list(),
    }
}

/// Accept activations for `scope` after validating its name.
pub fn register_scope(
    state: &SharedState,
    scope: &str,
) -> Result<ScopeChangeResponse, ServiceError> {
    validate_scope(scope).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let changed = state.scopes().register(scope);
    if changed {
        info!(scope, "scope registered");
    }
    Ok(ScopeChangeResponse {
        scope: scope.to_owned(),
        changed,
    })
}

/// Stop accepting activations for `scope`. Active boosters run to completion.
pub fn unregister_scope(state: &SharedState, scope: &str) -> ScopeChangeResponse {
    let changed = state.scopes().unregister(scope);
    if changed {
        info!(scope, "scope unregistered");
    }
    ScopeChangeResponse {
        scope: scope.to_owned(),
        changed,
    }
}

/// Disconnect hook: release the player's cached listing.
pub fn disconnect(state: &SharedState, player: &str) {
    state.cache().forget(player);
    debug!(player, "player disconnected");
}
