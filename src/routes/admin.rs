use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::booster::{GrantBoosterRequest, GrantBoosterResponse, PlayerBoostersResponse},
    error::AppError,
    services::booster_service,
    state::SharedState,
};

/// Admin endpoints for granting and inspecting boosters.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/boosters", post(grant_booster))
        .route(
            "/admin/players/{player}/boosters",
            get(view_player_boosters),
        )
}

#[utoipa::path(
    post,
    path = "/admin/boosters",
    tag = "admin",
    request_body = GrantBoosterRequest,
    responses(
        (status = 201, description = "Booster granted", body = GrantBoosterResponse),
        (status = 400, description = "Multiplier or duration out of bounds"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Grant a pending booster to a player.
pub async fn grant_booster(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GrantBoosterRequest>>,
) -> Result<(StatusCode, Json<GrantBoosterResponse>), AppError> {
    let id = booster_service::grant(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(GrantBoosterResponse { id })))
}

#[utoipa::path(
    get,
    path = "/admin/players/{player}/boosters",
    tag = "admin",
    params(("player" = String, Path, description = "Player name, matched case-insensitively")),
    responses(
        (status = 200, description = "Non-expired boosters read from storage", body = PlayerBoostersResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Inspect a player's boosters straight from storage, bypassing the cache.
pub async fn view_player_boosters(
    State(state): State<SharedState>,
    Path(player): Path<String>,
) -> Result<Json<PlayerBoostersResponse>, AppError> {
    Ok(Json(booster_service::view_player_boosters(&state, &player).await?))
}
