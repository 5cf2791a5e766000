use std::{io, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_tracker::{
    surfaces::{FixedPosition, FormSubmission, MapSurface, WorkoutView},
    terminal::{entry_line, TerminalMap, TerminalView},
    WorkoutController,
};
use workout_tracker_data_management::{
    storage::{FileStore, KeyValueStore},
    PersistenceGateway,
};
use workout_tracker_lib::{
    coordinates::Coordinates,
    workout::{WorkoutId, WorkoutKind},
};

/// Log runs and rides at map positions. Every invocation is one session.
#[derive(Parser)]
#[command(name = "workout-tracker", version)]
struct Cli {
    /// Store file, defaults to data/workouts.json under the project root
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Current position as "lat,lng". Without it the map stays unavailable
    #[arg(long, global = true, allow_hyphen_values = true, value_parser = parse_coordinates)]
    position: Option<Coordinates>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show stored workouts
    List,
    /// Log a new workout
    Add {
        #[command(subcommand)]
        workout: AddCommand,
    },
    /// Center on a workout
    Select { id: String },
    Delete { id: String },
    Edit { id: String },
    /// Delete every workout
    Reset,
}

#[derive(Subcommand)]
enum AddCommand {
    Running {
        #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinates)]
        at: Coordinates,
        #[arg(long)]
        distance: f64,
        #[arg(long)]
        duration: f64,
        #[arg(long)]
        cadence: f64,
    },
    Cycling {
        #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinates)]
        at: Coordinates,
        #[arg(long)]
        distance: f64,
        #[arg(long)]
        duration: f64,
        #[arg(long, allow_hyphen_values = true)]
        elevation: f64,
    },
}

impl AddCommand {
    fn into_submission(self) -> FormSubmission {
        match self {
            AddCommand::Running { at, distance, duration, cadence } => FormSubmission {
                kind: WorkoutKind::Running,
                distance_km: distance,
                duration_min: duration,
                cadence_or_elevation: cadence,
                coordinates: at,
            },
            AddCommand::Cycling { at, distance, duration, elevation } => FormSubmission {
                kind: WorkoutKind::Cycling,
                distance_km: distance,
                duration_min: duration,
                cadence_or_elevation: elevation,
                coordinates: at,
            },
        }
    }
}

fn parse_coordinates(value: &str) -> Result<Coordinates, String> {
    let (lat, lng) = value.split_once(',').ok_or_else(|| format!("expected \"lat,lng\", got {value:?}"))?;
    let lat = lat.trim().parse::<f64>().map_err(|err| format!("bad latitude: {err}"))?;
    let lng = lng.trim().parse::<f64>().map_err(|err| format!("bad longitude: {err}"))?;
    if !lat.is_finite() || !lng.is_finite() {
        return Err(format!("coordinates must be finite numbers, got {value:?}"));
    }
    Ok(Coordinates::new(lat, lng))
}

/// Workouts are placed by clicking the map, so there is nothing to click
/// until `--position` has loaded it.
fn add_workout<K: KeyValueStore, M: MapSurface, V: WorkoutView>(
    controller: &mut WorkoutController<K, M, V>,
    submission: FormSubmission,
) -> anyhow::Result<WorkoutId> {
    if !controller.on_map_click(submission.coordinates) {
        anyhow::bail!("The map isn't loaded, pass --position lat,lng to log a workout");
    }
    Ok(controller.submit(submission)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info,workout_tracker_data_management=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let store = match &cli.data {
        Some(path) => FileStore::open(path),
        None => FileStore::open_default(),
    }
    .context("Failed to open workout store")?;
    tracing::debug!("Using store at {:?}", store.path());

    // Restored entries are only echoed for `list`
    let view = TerminalView::new(io::stdout()).with_entries(matches!(cli.command, Command::List));

    let mut controller = WorkoutController::start(PersistenceGateway::new(store), TerminalMap::default(), view, &mut FixedPosition(cli.position));

    match cli.command {
        Command::List => {
            if controller.workouts().is_empty() {
                println!("No workouts logged yet");
            }
        }
        Command::Add { workout } => {
            let id = add_workout(&mut controller, workout.into_submission())?;
            if let Some(workout) = controller.workouts().find_by_id(&id) {
                println!("{}", entry_line(workout));
            }
        }
        Command::Select { id } => {
            let id = WorkoutId::from(id);
            if !controller.select(&id) {
                anyhow::bail!("No workout with id {id}");
            }
            if let Some(workout) = controller.workouts().find_by_id(&id) {
                println!("{}", entry_line(workout));
            }
        }
        Command::Delete { id } => {
            let id = WorkoutId::from(id);
            if controller.delete(&id) {
                println!("Deleted {id}");
            } else {
                println!("No workout with id {id}");
            }
        }
        Command::Edit { id } => controller.edit(&WorkoutId::from(id))?,
        Command::Reset => {
            let count = controller.workouts().len();
            controller.reset();
            println!("Removed {count} workouts");
        }
    }

    Ok(())
}
