pub mod coordinates;
pub mod record;
pub mod workout;
