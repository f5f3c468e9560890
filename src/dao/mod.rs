/// Booster persistence backends and the store contract.
pub mod booster_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
