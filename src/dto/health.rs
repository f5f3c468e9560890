//! Health check payload.

use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Scopes currently held by the active-booster registry.
    pub active_scopes: usize,
    /// Players with a cached booster listing.
    pub cached_players: usize,
}

impl HealthResponse {
    /// Build the response from the degraded flag and the in-memory view sizes.
    pub fn new(degraded: bool, active_scopes: usize, cached_players: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            active_scopes,
            cached_players,
        }
    }
}
