use std::fmt;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinates::Coordinates;

/// Number of trailing epoch-millisecond digits kept in an id.
const ID_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    /// The last ten digits of the instant in epoch milliseconds.
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        let millis = timestamp.timestamp_millis().to_string();
        let start = millis.len().saturating_sub(ID_DIGITS);
        Self(millis[start..].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WorkoutId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for WorkoutId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "running",
            WorkoutKind::Cycling => "cycling",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Cycling => "Cycling",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃‍♂️",
            WorkoutKind::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "Running on October 17"
pub fn display_label(kind: WorkoutKind, date: NaiveDate) -> String {
    format!("{} on {}", kind.title(), date.format("%B %-d"))
}

/// Minutes per kilometre.
pub fn pace(distance_km: f64, duration_min: f64) -> f64 {
    duration_min / distance_km
}

/// Kilometres per hour.
pub fn speed(distance_km: f64, duration_min: f64) -> f64 {
    distance_km / (duration_min / 60.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Running {
    pub(crate) cadence_spm: u32,
    pub(crate) pace_min_per_km: f64,
}

impl Running {
    pub fn cadence_spm(&self) -> u32 {
        self.cadence_spm
    }

    pub fn pace_min_per_km(&self) -> f64 {
        self.pace_min_per_km
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cycling {
    pub(crate) elevation_gain_m: f64,
    pub(crate) speed_km_per_h: f64,
}

impl Cycling {
    pub fn elevation_gain_m(&self) -> f64 {
        self.elevation_gain_m
    }

    pub fn speed_km_per_h(&self) -> f64 {
        self.speed_km_per_h
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutDetails {
    Running(Running),
    Cycling(Cycling),
}

/// A logged workout. Everything except the interaction counter is fixed at
/// construction; the constructors never validate their inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub(crate) id: WorkoutId,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) coordinates: Coordinates,
    pub(crate) distance_km: f64,
    pub(crate) duration_min: f64,
    pub(crate) interaction_count: u32,
    pub(crate) display_label: String,
    pub(crate) details: WorkoutDetails,
}

impl Workout {
    pub fn running(id: WorkoutId, created_at: DateTime<Utc>, coordinates: Coordinates, distance_km: f64, duration_min: f64, cadence_spm: u32) -> Self {
        let details = WorkoutDetails::Running(Running {
            cadence_spm,
            pace_min_per_km: pace(distance_km, duration_min),
        });
        Self::build(id, created_at, coordinates, distance_km, duration_min, details)
    }

    pub fn cycling(id: WorkoutId, created_at: DateTime<Utc>, coordinates: Coordinates, distance_km: f64, duration_min: f64, elevation_gain_m: f64) -> Self {
        let details = WorkoutDetails::Cycling(Cycling {
            elevation_gain_m,
            speed_km_per_h: speed(distance_km, duration_min),
        });
        Self::build(id, created_at, coordinates, distance_km, duration_min, details)
    }

    /// Stamped with the current time and an id derived from it.
    pub fn new_running(coordinates: Coordinates, distance_km: f64, duration_min: f64, cadence_spm: u32) -> Self {
        let now = Utc::now();
        Self::running(WorkoutId::from_timestamp(now), now, coordinates, distance_km, duration_min, cadence_spm)
    }

    pub fn new_cycling(coordinates: Coordinates, distance_km: f64, duration_min: f64, elevation_gain_m: f64) -> Self {
        let now = Utc::now();
        Self::cycling(WorkoutId::from_timestamp(now), now, coordinates, distance_km, duration_min, elevation_gain_m)
    }

    fn build(id: WorkoutId, created_at: DateTime<Utc>, coordinates: Coordinates, distance_km: f64, duration_min: f64, details: WorkoutDetails) -> Self {
        let kind = match details {
            WorkoutDetails::Running(_) => WorkoutKind::Running,
            WorkoutDetails::Cycling(_) => WorkoutKind::Cycling,
        };
        let local_date = created_at.with_timezone(&Local).date_naive();

        Self {
            id,
            created_at,
            coordinates,
            distance_km,
            duration_min,
            interaction_count: 0,
            display_label: display_label(kind, local_date),
            details,
        }
    }

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn kind(&self) -> WorkoutKind {
        match self.details {
            WorkoutDetails::Running(_) => WorkoutKind::Running,
            WorkoutDetails::Cycling(_) => WorkoutKind::Cycling,
        }
    }

    pub fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    pub fn details(&self) -> &WorkoutDetails {
        &self.details
    }

    pub fn select(&mut self) {
        self.interaction_count = self.interaction_count.saturating_add(1);
    }

    /// Recomputes pace or speed from the stored distance and duration.
    pub fn recompute_metrics(&mut self) {
        match &mut self.details {
            WorkoutDetails::Running(running) => running.pace_min_per_km = pace(self.distance_km, self.duration_min),
            WorkoutDetails::Cycling(cycling) => cycling.speed_km_per_h = speed(self.distance_km, self.duration_min),
        }
    }

    /// Value/unit lines shown in a list entry, in display order.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{} km", self.distance_km),
            format!("{} min", self.duration_min),
        ];

        match &self.details {
            WorkoutDetails::Running(running) => {
                lines.push(format!("{:.1} min/km", running.pace_min_per_km));
                lines.push(format!("{} spm", running.cadence_spm));
            }
            WorkoutDetails::Cycling(cycling) => {
                lines.push(format!("{:.1} km/h", cycling.speed_km_per_h));
                lines.push(format!("{} m", cycling.elevation_gain_m));
            }
        }

        lines
    }
}
