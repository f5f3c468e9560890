use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dao::models::BoosterId,
    dto::booster::{ActivationResponse, PlayerBoostersResponse},
    error::AppError,
    services::{activation_service, booster_service},
    state::SharedState,
};

/// Player-facing booster endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players/{player}/boosters", get(player_boosters))
        .route(
            "/players/{player}/boosters/{id}/activate",
            post(activate_booster),
        )
        .route("/players/{player}/disconnect", post(disconnect))
}

#[utoipa::path(
    get,
    path = "/players/{player}/boosters",
    tag = "players",
    params(("player" = String, Path, description = "Player name, matched case-insensitively")),
    responses(
        (status = 200, description = "Non-expired boosters, active first", body = PlayerBoostersResponse),
        (status = 409, description = "A load for this player is already in flight"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Return the player's pending and active boosters through the cache.
pub async fn player_boosters(
    State(state): State<SharedState>,
    Path(player): Path<String>,
) -> Result<Json<PlayerBoostersResponse>, AppError> {
    Ok(Json(booster_service::player_boosters(&state, &player).await?))
}

#[utoipa::path(
    post,
    path = "/players/{player}/boosters/{id}/activate",
    tag = "players",
    params(
        ("player" = String, Path, description = "Requesting player"),
        ("id" = i64, Path, description = "Booster identifier")
    ),
    responses(
        (status = 200, description = "Activation outcome, including rejections", body = ActivationResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
/// Activate one of the player's pending boosters.
pub async fn activate_booster(
    State(state): State<SharedState>,
    Path((player, id)): Path<(String, BoosterId)>,
) -> Result<Json<ActivationResponse>, AppError> {
    let result = activation_service::activate(&state, &player, id).await?;
    Ok(Json(ActivationResponse::from_result(result, state.now())))
}

#[utoipa::path(
    post,
    path = "/players/{player}/disconnect",
    tag = "players",
    params(("player" = String, Path, description = "Player that left")),
    responses((status = 204, description = "Cached listing released"))
)]
/// Release whatever is cached for a player that disconnected.
pub async fn disconnect(
    State(state): State<SharedState>,
    Path(player): Path<String>,
) -> StatusCode {
    booster_service::disconnect(&state, &player);
    StatusCode::NO_CONTENT
}
