use workout_tracker_lib::{
    coordinates::Coordinates,
    workout::{Workout, WorkoutId, WorkoutKind},
};

use crate::WorkoutError;

/// What the form hands over on submit. The third value is cadence for runs
/// and elevation gain for rides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormSubmission {
    pub kind: WorkoutKind,
    pub distance_km: f64,
    pub duration_min: f64,
    pub cadence_or_elevation: f64,
    pub coordinates: Coordinates,
}

pub trait MapSurface {
    type Marker;

    fn place_marker(&mut self, coordinates: Coordinates, popup_content: &str, style_class: &str) -> Self::Marker;
    fn recenter(&mut self, coordinates: Coordinates, zoom: u8);
    fn remove_marker(&mut self, marker: Self::Marker);
}

pub trait FormSurface {
    fn show_form(&mut self);
    fn clear_form(&mut self);
    fn hide_form(&mut self);
}

pub trait ListSurface {
    fn render_entry(&mut self, workout: &Workout);
    fn remove_entry(&mut self, id: &WorkoutId);
    fn show_delete_all(&mut self);
    fn hide_delete_all(&mut self);
}

pub trait Notifier {
    fn alert(&mut self, message: &str);
}

/// Everything on the page that isn't the map.
pub trait WorkoutView: FormSurface + ListSurface + Notifier {}

impl<T: FormSurface + ListSurface + Notifier> WorkoutView for T {}

pub trait PositionSource {
    fn current_position(&mut self) -> Result<Coordinates, WorkoutError>;
}

/// A position known up front, or none at all.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Option<Coordinates>);

impl PositionSource for FixedPosition {
    fn current_position(&mut self) -> Result<Coordinates, WorkoutError> {
        self.0
            .ok_or_else(|| WorkoutError::EnvironmentUnavailable("no position was provided".to_string()))
    }
}
