use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Boosters Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::scopes::list_scopes,
        crate::routes::scopes::register_scope,
        crate::routes::scopes::unregister_scope,
        crate::routes::scopes::active_booster,
        crate::routes::scopes::active_boosters,
        crate::routes::players::player_boosters,
        crate::routes::players::activate_booster,
        crate::routes::players::disconnect,
        crate::routes::admin::grant_booster,
        crate::routes::admin::view_player_boosters,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::booster::BoosterStatusDto,
            crate::dto::booster::BoosterSummary,
            crate::dto::booster::PlayerBoostersResponse,
            crate::dto::booster::ActiveBoosterSummary,
            crate::dto::booster::ActivationOutcome,
            crate::dto::booster::ActivationResponse,
            crate::dto::booster::GrantBoosterRequest,
            crate::dto::booster::GrantBoosterResponse,
            crate::dto::booster::ScopesResponse,
            crate::dto::booster::ScopeChangeResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "scopes", description = "Scope registration and active booster lookups"),
        (name = "players", description = "Player booster listing and activation"),
        (name = "admin", description = "Granting and inspecting boosters"),
    )
)]
/// OpenAPI document covering every route.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/scopes/{scope}/active",
            "/players/{player}/boosters/{id}/activate",
            "/admin/boosters",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
