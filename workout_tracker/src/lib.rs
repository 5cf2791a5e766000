pub mod controller;
pub mod error;
pub mod surfaces;
pub mod terminal;

pub use controller::WorkoutController;
pub use error::WorkoutError;

/// Zoom level used whenever the map is centered on something.
pub const MAP_ZOOM: u8 = 14;

pub const INVALID_INPUT_ALERT: &str = "Inputs have to be positive numbers!";
pub const POSITION_UNAVAILABLE_ALERT: &str = "Can't get your position";
