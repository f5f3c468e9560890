//! Service layer invoked by the routes and background tasks.

/// Activation write path and its outcomes.
pub mod activation_service;
/// Grant, listing and scope operations.
pub mod booster_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Periodic registry reconciliation against storage.
pub mod reconciliation;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
