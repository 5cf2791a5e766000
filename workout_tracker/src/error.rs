use thiserror::Error;
use workout_tracker_lib::workout::WorkoutKind;

#[derive(Debug, Error, PartialEq)]
pub enum WorkoutError {
    #[error("{kind} inputs have to be finite positive numbers")]
    InvalidInput { kind: WorkoutKind },
    #[error("current position is unavailable: {0}")]
    EnvironmentUnavailable(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}
