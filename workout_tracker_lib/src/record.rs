use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    coordinates::Coordinates,
    workout::{pace, speed, Cycling, Running, Workout, WorkoutDetails, WorkoutId, WorkoutKind},
};

/// The plain persisted shape of a workout. Kind-specific fields are only
/// present for the matching kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: WorkoutId,
    pub created_at: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub distance_km: f64,
    pub duration_min: f64,
    pub kind: WorkoutKind,
    #[serde(default)]
    pub interaction_count: u32,
    pub display_label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence_spm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_min_per_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_km_per_h: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("{kind} record {id} is missing {field}")]
    MissingField {
        id: WorkoutId,
        kind: WorkoutKind,
        field: &'static str,
    },
}

impl From<&Workout> for WorkoutRecord {
    fn from(workout: &Workout) -> Self {
        let mut record = WorkoutRecord {
            id: workout.id.clone(),
            created_at: workout.created_at,
            coordinates: workout.coordinates,
            distance_km: workout.distance_km,
            duration_min: workout.duration_min,
            kind: workout.kind(),
            interaction_count: workout.interaction_count,
            display_label: workout.display_label.clone(),
            cadence_spm: None,
            pace_min_per_km: None,
            elevation_gain_m: None,
            speed_km_per_h: None,
        };

        match &workout.details {
            WorkoutDetails::Running(running) => {
                record.cadence_spm = Some(running.cadence_spm);
                record.pace_min_per_km = Some(running.pace_min_per_km);
            }
            WorkoutDetails::Cycling(cycling) => {
                record.elevation_gain_m = Some(cycling.elevation_gain_m);
                record.speed_km_per_h = Some(cycling.speed_km_per_h);
            }
        }

        record
    }
}

/// Rebuilds the typed workout for the record's kind. Stored derived values
/// and the stored label are kept as-is; a derived value that was written as
/// `null` (non-finite) is recomputed.
impl TryFrom<WorkoutRecord> for Workout {
    type Error = RecordError;

    fn try_from(record: WorkoutRecord) -> Result<Self, Self::Error> {
        let missing = |field| RecordError::MissingField {
            id: record.id.clone(),
            kind: record.kind,
            field,
        };

        let details = match record.kind {
            WorkoutKind::Running => WorkoutDetails::Running(Running {
                cadence_spm: record.cadence_spm.ok_or_else(|| missing("cadenceSpm"))?,
                pace_min_per_km: record.pace_min_per_km.unwrap_or_else(|| pace(record.distance_km, record.duration_min)),
            }),
            WorkoutKind::Cycling => WorkoutDetails::Cycling(Cycling {
                elevation_gain_m: record.elevation_gain_m.ok_or_else(|| missing("elevationGainM"))?,
                speed_km_per_h: record.speed_km_per_h.unwrap_or_else(|| speed(record.distance_km, record.duration_min)),
            }),
        };

        Ok(Workout {
            id: record.id,
            created_at: record.created_at,
            coordinates: record.coordinates,
            distance_km: record.distance_km,
            duration_min: record.duration_min,
            interaction_count: record.interaction_count,
            display_label: record.display_label,
            details,
        })
    }
}
