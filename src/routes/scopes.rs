use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};

use crate::{
    dto::booster::{ActiveBoosterSummary, ScopeChangeResponse, ScopesResponse},
    error::AppError,
    services::booster_service,
    state::SharedState,
};

/// Scope registration and active-booster lookups served from memory.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/scopes", get(list_scopes))
        .route(
            "/scopes/{scope}",
            put(register_scope).delete(unregister_scope),
        )
        .route("/scopes/{scope}/active", get(active_booster))
        .route("/boosters/active", get(active_boosters))
}

#[utoipa::path(
    get,
    path = "/scopes",
    tag = "scopes",
    responses((status = 200, description = "Scopes registered as activatable", body = ScopesResponse))
)]
/// List the scopes this process accepts activations for.
pub async fn list_scopes(State(state): State<SharedState>) -> Json<ScopesResponse> {
    Json(booster_service::list_scopes(&state))
}

#[utoipa::path(
    put,
    path = "/scopes/{scope}",
    tag = "scopes",
    params(("scope" = String, Path, description = "Scope identifier, e.g. a game mode name")),
    responses(
        (status = 200, description = "Scope registered", body = ScopeChangeResponse),
        (status = 400, description = "Blank scope")
    )
)]
/// Register a scope as activatable.
pub async fn register_scope(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
) -> Result<Json<ScopeChangeResponse>, AppError> {
    Ok(Json(booster_service::register_scope(&state, &scope)?))
}

#[utoipa::path(
    delete,
    path = "/scopes/{scope}",
    tag = "scopes",
    params(("scope" = String, Path, description = "Scope identifier")),
    responses((status = 200, description = "Scope unregistered", body = ScopeChangeResponse))
)]
/// Stop accepting activations for a scope. Already active boosters keep running.
pub async fn unregister_scope(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
) -> Json<ScopeChangeResponse> {
    Json(booster_service::unregister_scope(&state, &scope))
}

#[utoipa::path(
    get,
    path = "/scopes/{scope}/active",
    tag = "scopes",
    params(("scope" = String, Path, description = "Scope identifier")),
    responses(
        (status = 200, description = "Booster active for the scope", body = ActiveBoosterSummary),
        (status = 404, description = "No active booster")
    )
)]
/// Return the booster currently active for a scope.
pub async fn active_booster(
    State(state): State<SharedState>,
    Path(scope): Path<String>,
) -> Result<Json<ActiveBoosterSummary>, AppError> {
    Ok(Json(booster_service::active_booster(&state, &scope)?))
}

#[utoipa::path(
    get,
    path = "/boosters/active",
    tag = "scopes",
    responses((status = 200, description = "Every active booster", body = [ActiveBoosterSummary]))
)]
/// Return every active booster, ordered by scope.
pub async fn active_boosters(State(state): State<SharedState>) -> Json<Vec<ActiveBoosterSummary>> {
    Json(booster_service::active_boosters(&state))
}
