use std::io::Write;

use workout_tracker_lib::{
    coordinates::Coordinates,
    workout::{Workout, WorkoutId},
};

use crate::surfaces::{FormSurface, ListSurface, MapSurface, Notifier};

/// Stands in for a rendered map: markers are numbered and only logged.
#[derive(Debug, Default)]
pub struct TerminalMap {
    next_marker: usize,
}

impl MapSurface for TerminalMap {
    type Marker = usize;

    fn place_marker(&mut self, coordinates: Coordinates, popup_content: &str, style_class: &str) -> usize {
        self.next_marker += 1;
        tracing::debug!("Marker #{} at [{coordinates}] ({style_class}): {popup_content}", self.next_marker);
        self.next_marker
    }

    fn recenter(&mut self, coordinates: Coordinates, zoom: u8) {
        tracing::debug!("Map centered on [{coordinates}] at zoom {zoom}");
    }

    fn remove_marker(&mut self, marker: usize) {
        tracing::debug!("Marker #{marker} removed");
    }
}

/// Prints list entries and alerts as plain lines.
pub struct TerminalView<W: Write> {
    out: W,
    entries: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out, entries: true }
    }

    /// Alerts are printed either way.
    pub fn with_entries(mut self, entries: bool) -> Self {
        self.entries = entries;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}") {
            tracing::error!("Failed to write to terminal: {err}");
        }
    }
}

pub fn entry_line(workout: &Workout) -> String {
    format!(
        "{}  {} {}  {}",
        workout.id(),
        workout.kind().icon(),
        workout.display_label(),
        workout.summary_lines().join(" · ")
    )
}

impl<W: Write> FormSurface for TerminalView<W> {
    fn show_form(&mut self) {
        tracing::trace!("Form shown");
    }

    fn clear_form(&mut self) {
        tracing::trace!("Form cleared");
    }

    fn hide_form(&mut self) {
        tracing::trace!("Form hidden");
    }
}

impl<W: Write> ListSurface for TerminalView<W> {
    fn render_entry(&mut self, workout: &Workout) {
        if self.entries {
            self.line(&entry_line(workout));
        }
    }

    fn remove_entry(&mut self, id: &WorkoutId) {
        if self.entries {
            self.line(&format!("- {id}"));
        }
    }

    fn show_delete_all(&mut self) {
        tracing::trace!("Delete-all shown");
    }

    fn hide_delete_all(&mut self) {
        tracing::trace!("Delete-all hidden");
    }
}

impl<W: Write> Notifier for TerminalView<W> {
    fn alert(&mut self, message: &str) {
        self.line(&format!("! {message}"));
    }
}
