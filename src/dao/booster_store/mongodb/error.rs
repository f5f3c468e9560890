use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::dao::models::BoosterId;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures that can occur while talking to MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as configured.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// No ping succeeded while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings attempted.
        attempts: u32,
        /// Last driver error.
        #[source]
        source: MongoError,
    },
    /// The retry policy was configured with zero attempts.
    #[error("MongoDB ping retry policy allows no attempts")]
    NoPingAttempts,
    /// A health check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Indexed collection.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The id counter could not be incremented.
    #[error("failed to allocate a booster id")]
    AllocateId {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The id counter upsert returned nothing.
    #[error("booster id counter returned no document")]
    MissingCounter,
    /// A granted booster could not be written.
    #[error("failed to insert booster for `{player}`")]
    InsertBooster {
        /// Owner of the booster.
        player: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A booster could not be read by id.
    #[error("failed to load booster `{id}`")]
    LoadBooster {
        /// Requested booster.
        id: BoosterId,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A player's boosters could not be listed.
    #[error("failed to list boosters of `{player}`")]
    ListPlayerBoosters {
        /// Requested player.
        player: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The active boosters could not be listed.
    #[error("failed to list active boosters")]
    ListActiveBoosters {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The activation write failed.
    #[error("failed to mark booster `{id}` as activated")]
    MarkActivated {
        /// Booster being activated.
        id: BoosterId,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
