use const_format::concatcp;
use thiserror::Error;

pub mod persistence;
pub mod storage;
pub mod store;

pub use persistence::PersistenceGateway;
pub use store::WorkoutStore;

pub const DATA_DIR: &str = "data/";
pub const STORE_PATH: &str = concatcp!(DATA_DIR, "workouts.json");

/// The single key all workouts are persisted under.
pub const WORKOUTS_KEY: &str = "workouts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("storage contents could not be (de)serialized: {0}")]
    Serialization(String),
}
