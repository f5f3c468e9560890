use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode and the size of the in-memory views, logging storage issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_booster_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::new(
        state.is_degraded(),
        state.registry().len(),
        state.cache().len(),
    )
}
