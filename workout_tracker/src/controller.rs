use chrono::{DateTime, TimeDelta, Utc};
use workout_tracker_data_management::{storage::KeyValueStore, PersistenceGateway, WorkoutStore};
use workout_tracker_lib::{
    coordinates::Coordinates,
    record::WorkoutRecord,
    workout::{Workout, WorkoutId, WorkoutKind},
};

use crate::{
    surfaces::{FormSubmission, MapSurface, PositionSource, WorkoutView},
    WorkoutError, INVALID_INPUT_ALERT, MAP_ZOOM, POSITION_UNAVAILABLE_ALERT,
};

/// Rebuilds typed workouts from loaded records, dropping the ones that can't be.
pub fn rehydrate(records: Vec<WorkoutRecord>) -> Vec<Workout> {
    records
        .into_iter()
        .filter_map(|record| match Workout::try_from(record) {
            Ok(workout) => Some(workout),
            Err(err) => {
                tracing::warn!("Dropping stored workout: {err}");
                None
            }
        })
        .collect()
}

fn validate(submission: &FormSubmission) -> Result<(), WorkoutError> {
    let FormSubmission { kind, distance_km, duration_min, cadence_or_elevation, coordinates } = *submission;

    let finite = [distance_km, duration_min, cadence_or_elevation, coordinates.latitude, coordinates.longitude]
        .iter()
        .all(|value| value.is_finite());
    let in_range = distance_km > 0.0
        && duration_min > 0.0
        && match kind {
            WorkoutKind::Running => cadence_or_elevation > 0.0,
            WorkoutKind::Cycling => cadence_or_elevation >= 0.0,
        };

    if finite && in_range {
        Ok(())
    } else {
        Err(WorkoutError::InvalidInput { kind })
    }
}

/// The running application: owns the workouts, the persistence gateway and
/// the surfaces, and turns user intents into changes on all of them.
///
/// Markers are `None` until the map has been loaded. Once loaded, marker `i`
/// always belongs to workout `i`.
pub struct WorkoutController<K: KeyValueStore, M: MapSurface, V: WorkoutView> {
    workouts: WorkoutStore,
    gateway: PersistenceGateway<K>,
    map: M,
    markers: Option<Vec<M::Marker>>,
    view: V,
    pending_click: Option<Coordinates>,
}

impl<K: KeyValueStore, M: MapSurface, V: WorkoutView> WorkoutController<K, M, V> {
    pub fn new(gateway: PersistenceGateway<K>, map: M, view: V) -> Self {
        Self {
            workouts: WorkoutStore::new(),
            gateway,
            map,
            markers: None,
            view,
            pending_click: None,
        }
    }

    /// Restores stored workouts, then tries to bring up the map at the current position.
    pub fn start(gateway: PersistenceGateway<K>, map: M, view: V, position: &mut impl PositionSource) -> Self {
        let mut controller = Self::new(gateway, map, view);
        controller.restore();
        controller.acquire_position(position);
        controller
    }

    pub fn restore(&mut self) -> usize {
        let workouts = rehydrate(self.gateway.load());
        self.workouts.replace_all(workouts);

        for workout in self.workouts.all() {
            self.view.render_entry(workout);
        }

        if !self.workouts.is_empty() {
            self.view.show_delete_all();
        }

        tracing::info!("Restored {} workouts", self.workouts.len());
        self.workouts.len()
    }

    pub fn acquire_position(&mut self, position: &mut impl PositionSource) {
        match position.current_position() {
            Ok(coordinates) => self.load_map(coordinates),
            Err(err) => {
                tracing::warn!("{err}");
                self.view.alert(POSITION_UNAVAILABLE_ALERT);
            }
        }
    }

    /// Centers the map and places a marker for every workout, in store order.
    pub fn load_map(&mut self, center: Coordinates) {
        self.map.recenter(center, MAP_ZOOM);

        if let Some(markers) = self.markers.take() {
            for marker in markers {
                self.map.remove_marker(marker);
            }
        }

        let markers: Vec<M::Marker> = self.workouts.all().iter().map(|workout| place_marker(&mut self.map, workout)).collect();
        self.markers = Some(markers);
        tracing::debug!("Map loaded at {center}");
    }

    pub fn is_map_loaded(&self) -> bool {
        self.markers.is_some()
    }

    /// Ignored until the map is loaded.
    pub fn on_map_click(&mut self, coordinates: Coordinates) -> bool {
        if !self.is_map_loaded() {
            return false;
        }
        self.pending_click = Some(coordinates);
        self.view.show_form();
        true
    }

    pub fn pending_click(&self) -> Option<Coordinates> {
        self.pending_click
    }

    pub fn submit(&mut self, submission: FormSubmission) -> Result<WorkoutId, WorkoutError> {
        if let Err(err) = validate(&submission) {
            tracing::debug!("Rejected submission {submission:?}");
            self.view.alert(INVALID_INPUT_ALERT);
            return Err(err);
        }

        let (id, created_at) = self.fresh_id(Utc::now());
        let FormSubmission { kind, distance_km, duration_min, cadence_or_elevation, coordinates } = submission;
        let workout = match kind {
            WorkoutKind::Running => {
                let cadence_spm = cadence_or_elevation.round().max(1.0) as u32;
                Workout::running(id.clone(), created_at, coordinates, distance_km, duration_min, cadence_spm)
            }
            WorkoutKind::Cycling => Workout::cycling(id.clone(), created_at, coordinates, distance_km, duration_min, cadence_or_elevation),
        };

        if let Some(markers) = &mut self.markers {
            markers.push(place_marker(&mut self.map, &workout));
        }
        self.view.render_entry(&workout);
        self.workouts.add(workout);

        self.view.clear_form();
        self.view.hide_form();
        self.pending_click = None;

        self.persist();
        self.view.show_delete_all();

        tracing::info!("Logged {kind} workout {id}");
        Ok(id)
    }

    /// Removes the workout and its marker at the same index. Unknown ids are ignored.
    pub fn delete(&mut self, id: &WorkoutId) -> bool {
        let Some(index) = self.workouts.index_of(id) else {
            tracing::debug!("Nothing to delete for {id}");
            return false;
        };

        self.workouts.remove_at(index);
        if let Some(markers) = &mut self.markers {
            let marker = markers.remove(index);
            self.map.remove_marker(marker);
        }

        if let Err(err) = self.gateway.clear() {
            tracing::error!("Failed to clear stored workouts: {err}");
        }
        self.persist();

        self.view.remove_entry(id);
        if self.workouts.is_empty() {
            self.view.hide_delete_all();
        }

        tracing::info!("Deleted workout {id}");
        true
    }

    /// Recenters on the workout and counts the interaction. The count is not persisted.
    pub fn select(&mut self, id: &WorkoutId) -> bool {
        let Some(workout) = self.workouts.select(id) else {
            return false;
        };

        if self.markers.is_some() {
            self.map.recenter(workout.coordinates(), MAP_ZOOM);
        }
        tracing::debug!("Selected {id} ({} interactions)", workout.interaction_count());
        true
    }

    pub fn edit(&mut self, _id: &WorkoutId) -> Result<(), WorkoutError> {
        Err(WorkoutError::NotImplemented("editing a workout"))
    }

    /// Forgets every workout, stored or shown.
    pub fn reset(&mut self) {
        if let Err(err) = self.gateway.clear() {
            tracing::error!("Failed to clear stored workouts: {err}");
        }

        if let Some(markers) = &mut self.markers {
            for marker in markers.drain(..) {
                self.map.remove_marker(marker);
            }
        }

        for workout in self.workouts.all() {
            self.view.remove_entry(workout.id());
        }
        self.workouts.replace_all(Vec::new());
        self.pending_click = None;
        self.view.hide_delete_all();

        tracing::info!("All workouts reset");
    }

    pub fn workouts(&self) -> &WorkoutStore {
        &self.workouts
    }

    pub fn gateway(&self) -> &PersistenceGateway<K> {
        &self.gateway
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    fn persist(&mut self) {
        if let Err(err) = self.gateway.save(self.workouts.all()) {
            tracing::error!("Failed to save workouts: {err}");
        }
    }

    /// Steps the creation instant forward a millisecond at a time until its id is free.
    fn fresh_id(&self, mut created_at: DateTime<Utc>) -> (WorkoutId, DateTime<Utc>) {
        loop {
            let id = WorkoutId::from_timestamp(created_at);
            if !self.workouts.contains(&id) {
                return (id, created_at);
            }
            created_at += TimeDelta::milliseconds(1);
        }
    }
}

fn place_marker<M: MapSurface>(map: &mut M, workout: &Workout) -> M::Marker {
    let kind = workout.kind();
    let popup = format!("{} {}", kind.icon(), workout.display_label());
    map.place_marker(workout.coordinates(), &popup, &format!("{kind}-popup"))
}

#[cfg(test)]
mod tests {
    use workout_tracker_data_management::storage::MemoryStore;

    use crate::surfaces::{FixedPosition, FormSurface, ListSurface, Notifier};

    use super::*;

    #[derive(Default)]
    struct RecordingMap {
        next_marker: usize,
        live: Vec<usize>,
        placed: Vec<(Coordinates, String, String)>,
        centers: Vec<(Coordinates, u8)>,
    }

    impl MapSurface for RecordingMap {
        type Marker = usize;

        fn place_marker(&mut self, coordinates: Coordinates, popup_content: &str, style_class: &str) -> usize {
            self.placed.push((coordinates, popup_content.to_string(), style_class.to_string()));
            self.next_marker += 1;
            self.live.push(self.next_marker);
            self.next_marker
        }

        fn recenter(&mut self, coordinates: Coordinates, zoom: u8) {
            self.centers.push((coordinates, zoom));
        }

        fn remove_marker(&mut self, marker: usize) {
            self.live.retain(|live| *live != marker);
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        ShowForm,
        ClearForm,
        HideForm,
        Render(WorkoutId),
        Remove(WorkoutId),
        ShowDeleteAll,
        HideDeleteAll,
        Alert(String),
    }

    #[derive(Default)]
    struct RecordingView {
        events: Vec<Event>,
    }

    impl RecordingView {
        fn alerts(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    Event::Alert(message) => Some(message.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, wanted: &Event) -> usize {
            self.events.iter().filter(|event| *event == wanted).count()
        }
    }

    impl FormSurface for RecordingView {
        fn show_form(&mut self) {
            self.events.push(Event::ShowForm);
        }

        fn clear_form(&mut self) {
            self.events.push(Event::ClearForm);
        }

        fn hide_form(&mut self) {
            self.events.push(Event::HideForm);
        }
    }

    impl ListSurface for RecordingView {
        fn render_entry(&mut self, workout: &Workout) {
            self.events.push(Event::Render(workout.id().clone()));
        }

        fn remove_entry(&mut self, id: &WorkoutId) {
            self.events.push(Event::Remove(id.clone()));
        }

        fn show_delete_all(&mut self) {
            self.events.push(Event::ShowDeleteAll);
        }

        fn hide_delete_all(&mut self) {
            self.events.push(Event::HideDeleteAll);
        }
    }

    impl Notifier for RecordingView {
        fn alert(&mut self, message: &str) {
            self.events.push(Event::Alert(message.to_string()));
        }
    }

    type TestController = WorkoutController<MemoryStore, RecordingMap, RecordingView>;

    fn home() -> Coordinates {
        Coordinates::new(39.0, -12.0)
    }

    fn started(store: MemoryStore, position: Option<Coordinates>) -> TestController {
        WorkoutController::start(PersistenceGateway::new(store), RecordingMap::default(), RecordingView::default(), &mut FixedPosition(position))
    }

    fn run(distance_km: f64, duration_min: f64, cadence: f64) -> FormSubmission {
        FormSubmission {
            kind: WorkoutKind::Running,
            distance_km,
            duration_min,
            cadence_or_elevation: cadence,
            coordinates: home(),
        }
    }

    fn ride(distance_km: f64, duration_min: f64, elevation: f64) -> FormSubmission {
        FormSubmission {
            kind: WorkoutKind::Cycling,
            distance_km,
            duration_min,
            cadence_or_elevation: elevation,
            coordinates: Coordinates::new(39.1, -12.1),
        }
    }

    fn assert_markers_in_lockstep(controller: &TestController) {
        let placed = controller.map().live.len();
        assert_eq!(placed, controller.workouts().len());
    }

    #[test]
    fn submit_adds_renders_persists_and_places_marker() {
        let mut controller = started(MemoryStore::new(), Some(home()));
        assert!(controller.on_map_click(home()));
        assert_eq!(controller.pending_click(), Some(home()));

        let id = controller.submit(run(5.2, 178.0, 170.0)).unwrap();

        let workout = controller.workouts().find_by_id(&id).unwrap();
        assert_eq!(workout.kind(), WorkoutKind::Running);
        assert!(workout.display_label().starts_with("Running on "));
        assert_eq!(controller.gateway().load().len(), 1);
        assert_eq!(controller.pending_click(), None);

        let (coordinates, popup, style) = &controller.map().placed[0];
        assert_eq!(*coordinates, home());
        assert_eq!(popup, &format!("{} {}", WorkoutKind::Running.icon(), workout.display_label()));
        assert_eq!(style, "running-popup");

        assert_eq!(
            controller.view().events,
            vec![Event::ShowForm, Event::Render(id.clone()), Event::ClearForm, Event::HideForm, Event::ShowDeleteAll]
        );
    }

    #[test]
    fn invalid_running_input_alerts_and_changes_nothing() {
        let mut controller = started(MemoryStore::new(), Some(home()));

        for submission in [run(0.0, 30.0, 170.0), run(5.0, -1.0, 170.0), run(5.0, 30.0, 0.0), run(f64::NAN, 30.0, 170.0), run(5.0, f64::INFINITY, 170.0)] {
            assert_eq!(controller.submit(submission), Err(WorkoutError::InvalidInput { kind: WorkoutKind::Running }));
        }

        assert!(controller.workouts().is_empty());
        assert!(controller.gateway().store().is_empty());
        assert!(controller.map().placed.is_empty());
        assert_eq!(controller.view().alerts(), vec![INVALID_INPUT_ALERT; 5]);
    }

    #[test]
    fn cycling_allows_flat_rides_but_not_negative_elevation() {
        let mut controller = started(MemoryStore::new(), Some(home()));

        assert!(controller.submit(ride(27.0, 523.0, 0.0)).is_ok());
        assert!(controller.submit(ride(27.0, 523.0, -5.0)).is_err());
        assert!(controller.submit(ride(27.0, 523.0, f64::NAN)).is_err());
        assert!(controller.submit(ride(0.0, 523.0, 200.0)).is_err());
        assert_eq!(controller.workouts().len(), 1);
    }

    #[test]
    fn ids_stay_unique_within_the_same_millisecond() {
        let mut controller = started(MemoryStore::new(), None);
        let ids: Vec<WorkoutId> = (0..20).map(|_| controller.submit(ride(10.0, 30.0, 5.0)).unwrap()).collect();

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(controller.workouts().index_of(id), Some(i));
        }
    }

    #[test]
    fn deleting_last_workout_hides_delete_all() {
        let mut controller = started(MemoryStore::new(), Some(home()));
        let id = controller.submit(run(5.2, 178.0, 170.0)).unwrap();

        assert!(controller.delete(&id));

        assert!(controller.workouts().is_empty());
        assert!(controller.gateway().load().is_empty());
        assert!(controller.map().live.is_empty());
        assert_eq!(controller.view().count(&Event::Remove(id)), 1);
        assert_eq!(controller.view().count(&Event::HideDeleteAll), 1);
    }

    #[test]
    fn deleting_one_of_many_keeps_delete_all_and_marker_pairing() {
        let mut controller = started(MemoryStore::new(), Some(home()));
        let first = controller.submit(run(5.0, 25.0, 170.0)).unwrap();
        let second = controller.submit(ride(20.0, 60.0, 100.0)).unwrap();
        let third = controller.submit(run(10.0, 55.0, 165.0)).unwrap();
        let second_marker = controller.map().live[1];

        assert!(controller.delete(&second));

        assert_eq!(controller.view().count(&Event::HideDeleteAll), 0);
        assert!(!controller.map().live.contains(&second_marker));
        assert_markers_in_lockstep(&controller);

        let stored: Vec<WorkoutId> = controller.gateway().load().into_iter().map(|record| record.id).collect();
        assert_eq!(stored, vec![first, third]);
    }

    #[test]
    fn deleting_unknown_id_is_silent() {
        let mut controller = started(MemoryStore::new(), Some(home()));
        controller.submit(run(5.0, 25.0, 170.0)).unwrap();
        let events_before = controller.view().events.len();

        assert!(!controller.delete(&"missing".into()));
        assert_eq!(controller.workouts().len(), 1);
        assert_eq!(controller.view().events.len(), events_before);
        assert_markers_in_lockstep(&controller);
    }

    #[test]
    fn delete_without_map_leaves_no_markers_behind() {
        let mut controller = started(MemoryStore::new(), None);
        let id = controller.submit(run(5.0, 25.0, 170.0)).unwrap();
        controller.submit(run(6.0, 30.0, 170.0)).unwrap();

        assert!(controller.delete(&id));
        assert!(controller.map().placed.is_empty());
        assert_eq!(controller.workouts().len(), 1);
    }

    #[test]
    fn non_finite_coordinates_are_rejected_and_earlier_workouts_survive() {
        let mut controller = started(MemoryStore::new(), None);
        let first = controller.submit(run(5.0, 25.0, 170.0)).unwrap();
        let second = controller.submit(ride(20.0, 60.0, 100.0)).unwrap();

        let nowhere = FormSubmission { coordinates: Coordinates::new(f64::NAN, 2.0), ..run(5.0, 25.0, 170.0) };
        assert_eq!(controller.submit(nowhere), Err(WorkoutError::InvalidInput { kind: WorkoutKind::Running }));
        let off_the_map = FormSubmission { coordinates: Coordinates::new(1.0, f64::INFINITY), ..ride(20.0, 60.0, 100.0) };
        assert_eq!(controller.submit(off_the_map), Err(WorkoutError::InvalidInput { kind: WorkoutKind::Cycling }));
        assert_eq!(controller.view().alerts(), vec![POSITION_UNAVAILABLE_ALERT, INVALID_INPUT_ALERT, INVALID_INPUT_ALERT]);

        let restarted = started(controller.gateway().store().clone(), None);
        let ids: Vec<&WorkoutId> = restarted.workouts().all().iter().map(Workout::id).collect();
        assert_eq!(ids, vec![&first, &second]);
    }

    #[test]
    fn restart_restores_in_order_and_places_markers() {
        let mut controller = started(MemoryStore::new(), None);
        let first = controller.submit(run(5.0, 25.0, 170.0)).unwrap();
        let second = controller.submit(ride(20.0, 60.0, 100.0)).unwrap();
        let stored = controller.gateway().store().clone();

        let restarted = started(stored, Some(home()));

        let ids: Vec<&WorkoutId> = restarted.workouts().all().iter().map(Workout::id).collect();
        assert_eq!(ids, vec![&first, &second]);
        assert_eq!(restarted.workouts().all(), controller.workouts().all());
        assert_eq!(
            restarted.view().events,
            vec![Event::Render(first), Event::Render(second), Event::ShowDeleteAll]
        );
        assert_eq!(restarted.map().centers, vec![(home(), MAP_ZOOM)]);
        assert_markers_in_lockstep(&restarted);
    }

    #[test]
    fn missing_position_alerts_once_and_keeps_map_inert() {
        let mut controller = started(MemoryStore::new(), None);

        assert!(!controller.is_map_loaded());
        assert_eq!(controller.view().alerts(), vec![POSITION_UNAVAILABLE_ALERT]);
        assert!(!controller.on_map_click(home()));
        assert_eq!(controller.view().count(&Event::ShowForm), 0);
    }

    #[test]
    fn malformed_storage_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set_item("workouts", "{\"not\": \"a list\"}".into()).unwrap();

        let controller = started(store, Some(home()));
        assert!(controller.workouts().is_empty());
        assert_eq!(controller.view().count(&Event::ShowDeleteAll), 0);
    }

    #[test]
    fn select_recenters_and_counts() {
        let mut controller = started(MemoryStore::new(), Some(home()));
        let id = controller.submit(ride(20.0, 60.0, 100.0)).unwrap();

        assert!(controller.select(&id));
        assert!(controller.select(&id));
        assert!(!controller.select(&"missing".into()));

        assert_eq!(controller.workouts().find_by_id(&id).unwrap().interaction_count(), 2);
        assert_eq!(controller.map().centers.last(), Some(&(Coordinates::new(39.1, -12.1), MAP_ZOOM)));
        assert_eq!(controller.gateway().load()[0].interaction_count, 0);
    }

    #[test]
    fn edit_is_not_implemented() {
        let mut controller = started(MemoryStore::new(), None);
        let id = controller.submit(run(5.0, 25.0, 170.0)).unwrap();
        assert!(matches!(controller.edit(&id), Err(WorkoutError::NotImplemented(_))));
    }

    #[test]
    fn reset_clears_everything() {
        let mut controller = started(MemoryStore::new(), Some(home()));
        controller.submit(run(5.0, 25.0, 170.0)).unwrap();
        controller.submit(ride(20.0, 60.0, 100.0)).unwrap();

        controller.reset();

        assert!(controller.workouts().is_empty());
        assert!(controller.gateway().load().is_empty());
        assert!(controller.gateway().store().is_empty());
        assert!(controller.map().live.is_empty());
        assert_eq!(controller.view().count(&Event::HideDeleteAll), 1);
        assert!(controller.is_map_loaded());
    }

    #[test]
    fn rehydrate_drops_incomplete_records() {
        let good = Workout::new_cycling(home(), 10.0, 30.0, 5.0);
        let mut bad = WorkoutRecord::from(&Workout::new_running(home(), 5.0, 25.0, 170));
        bad.cadence_spm = None;

        let restored = rehydrate(vec![WorkoutRecord::from(&good), bad]);
        assert_eq!(restored, vec![good]);
    }
}
