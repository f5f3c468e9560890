use axum::Router;

use crate::state::SharedState;

/// Grant and inspection endpoints.
pub mod admin;
/// Swagger UI.
pub mod docs;
/// Health probe.
pub mod health;
/// Player listing, activation and disconnect endpoints.
pub mod players;
/// Scope registration and active-booster lookups.
pub mod scopes;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(scopes::router())
        .merge(players::router())
        .merge(admin::router())
        .merge(docs::router())
        .with_state(state)
}
