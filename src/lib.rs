//! Library crate for boosters-back, exposing modules for binaries and integration tests.

pub mod clock;
pub mod config;
/// Persistence layer: entities and booster stores.
pub mod dao;
/// Request and response payloads of the REST API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers grouped by API area.
pub mod routes;
pub mod services;
/// Shared application state and the in-memory booster views.
pub mod state;
