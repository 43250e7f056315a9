use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("player database `{database}` did not answer a ping after {attempts} attempt(s)")]
    InitialPing {
        database: String,
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to register player `{student_name}` from `{college_name}`")]
    RegisterPlayer {
        student_name: String,
        college_name: String,
        #[source]
        source: MongoError,
    },
    #[error("upsert of player `{student_name}` from `{college_name}` returned no document")]
    MissingUpsert {
        student_name: String,
        college_name: String,
    },
    #[error("failed to record score for player `{id}`")]
    RecordScore {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load player `{id}`")]
    LoadPlayer {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("stored player id `{id}` is not a valid uuid")]
    CorruptPlayerId {
        id: String,
        #[source]
        source: uuid::Error,
    },
    #[error("failed to aggregate leaderboard")]
    Leaderboard {
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Whether the error means the database could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            MongoDaoError::InvalidUri { .. }
                | MongoDaoError::ClientConstruction { .. }
                | MongoDaoError::InitialPing { .. }
                | MongoDaoError::HealthPing { .. }
        )
    }
}

/// True when `err` reports a unique index violation.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
