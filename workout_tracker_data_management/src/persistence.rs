use serde_json::Value;
use workout_tracker_lib::{record::WorkoutRecord, workout::Workout};

use crate::{storage::KeyValueStore, StorageError, WORKOUTS_KEY};

/// Moves the ordered workout list in and out of a key-value store as a JSON
/// array of plain records under `WORKOUTS_KEY`.
#[derive(Debug)]
pub struct PersistenceGateway<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Overwrites whatever was stored before.
    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), StorageError> {
        let records: Vec<WorkoutRecord> = workouts.iter().map(WorkoutRecord::from).collect();
        let json = serde_json::to_string(&records)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        self.store.set_item(WORKOUTS_KEY, json)?;
        tracing::debug!("Saved {} workouts", records.len());
        Ok(())
    }

    /// Absent, unreadable or non-array data comes back as an empty list.
    /// Array entries that aren't valid records are skipped one by one.
    pub fn load(&self) -> Vec<WorkoutRecord> {
        let json = match self.store.get_item(WORKOUTS_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                tracing::debug!("No workouts stored yet");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!("Failed to read stored workouts: {err}");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<Vec<Value>>(&json) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("Ignoring malformed workouts: {err}");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<WorkoutRecord>(entry) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!("Skipping stored workout #{index}: {err}");
                    None
                }
            })
            .collect()
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove_item(WORKOUTS_KEY)
    }
}
