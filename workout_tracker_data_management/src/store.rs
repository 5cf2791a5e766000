use workout_tracker_lib::workout::{Workout, WorkoutId};

/// Workouts in insertion order, which is also display order.
/// Callers are responsible for handing in unique ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    pub fn find_by_id(&self, id: &WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|workout| workout.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: &WorkoutId) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|workout| workout.id() == id)
    }

    pub fn index_of(&self, id: &WorkoutId) -> Option<usize> {
        self.workouts.iter().position(|workout| workout.id() == id)
    }

    pub fn contains(&self, id: &WorkoutId) -> bool {
        self.index_of(id).is_some()
    }

    /// Does nothing if no workout has this id.
    pub fn remove_by_id(&mut self, id: &WorkoutId) -> Option<Workout> {
        let index = self.index_of(id)?;
        Some(self.workouts.remove(index))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Workout> {
        (index < self.workouts.len()).then(|| self.workouts.remove(index))
    }

    /// Bumps the interaction counter of the matching workout.
    pub fn select(&mut self, id: &WorkoutId) -> Option<&Workout> {
        let workout = self.find_by_id_mut(id)?;
        workout.select();
        Some(&*workout)
    }

    pub fn replace_all(&mut self, workouts: Vec<Workout>) {
        self.workouts = workouts;
    }

    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}
