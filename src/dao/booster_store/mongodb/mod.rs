mod error;
mod models;
/// Connection parameters and the initial ping.
pub mod connection;
/// [`BoosterStore`](crate::dao::booster_store::BoosterStore) implementation.
pub mod store;

pub use connection::{MongoConfig, PingRetry};
pub use error::MongoDaoError;
pub use store::MongoBoosterStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
