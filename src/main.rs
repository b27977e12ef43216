mod app;
mod shell;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use app::App;
use uvmap_core::{AppError, Config, ConfigError, ValidationResult};
use uvmap_uv::{export, Coordinates, Resolution, SubmitOutcome, RATE_LIMIT_MESSAGE};

/// Real-time UV index lookups with a shared note board
///
/// Each one-shot command starts a fresh session, so the "same point" and
/// "submission in flight" guards only act within `shell`.
#[derive(Debug, Parser)]
#[command(name = "uvmap", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the UV index for a point (defaults to the configured map center)
    Resolve {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
    },
    /// Attach a note to the current reading of a point
    Comment {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// UV value on screen, used when no reading can be fetched
        #[arg(long)]
        uv: Option<f64>,
        text: String,
    },
    /// Save a note under its own timestamp id
    Note {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long)]
        uv: f64,
        text: String,
    },
    /// List saved notes
    List,
    /// Delete a stored document by id
    Delete { id: String },
    /// Export every stored reading to CSV
    Export {
        #[arg(default_value = "datos_uv.csv")]
        path: PathBuf,
    },
    /// Read map events from stdin, keeping one session across them
    Shell,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn print_display(app: &App) {
    let display = app.session().display();
    match display.uv {
        Some(uv) => println!("Radiación UV: {}", uv),
        None => println!("Radiación UV: sin datos"),
    }
    if let Some(level) = display.level {
        println!("Nivel de UV: {}", level);
    }
    println!("Barra: {} {}", display.bar_color, display.bar_width());
    if !display.warning.is_empty() {
        println!("{}", display.warning);
    }
    if let Some(notice) = display.notice {
        println!("{}", notice);
    }
}

async fn resolve_and_print(app: &App, coords: Coordinates) {
    match app
        .orchestrator()
        .select_location(app.session(), coords, now_ms())
        .await
    {
        Resolution::Served(reading) => {
            tracing::debug!("Served {:?} reading for {}", reading.source, coords)
        }
        Resolution::SameLocation => {}
        Resolution::RateLimited => tracing::warn!("{}", RATE_LIMIT_MESSAGE),
        Resolution::Failed => eprintln!("No se pudo obtener la radiación UV."),
    }
    print_display(app);
}

async fn print_annotations(app: &App) {
    for note in app.annotations().list(app.session()).await {
        println!(
            "{}\t{}, {}\tUV {}\t{}\t{}",
            note.id, note.lat, note.lng, note.uv, note.date_string, note.comment
        );
    }
}

async fn delete_and_report(app: &App, id: &str) {
    if !app.annotations().delete(app.session(), id).await {
        eprintln!("No se pudo eliminar {}", id);
    }
}

fn report_submit(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Saved { id } => println!("Comentario guardado ({})", id),
        SubmitOutcome::Duplicate { id } => println!("El comentario ya existe ({})", id),
        SubmitOutcome::Empty | SubmitOutcome::InFlight => {}
        SubmitOutcome::Unavailable => eprintln!("No se pudo guardar el comentario."),
    }
}

/// Load and validate config, reporting config problems with their user message.
fn load_config() -> Result<(Config, ValidationResult)> {
    Config::load_validated().map_err(|e| match e.downcast::<ConfigError>() {
        Ok(config_err) => {
            let err = AppError::from(config_err);
            tracing::error!("{}", err);
            eprintln!("{}", err.user_message());
            err.into()
        }
        Err(other) => {
            tracing::error!("{:#}", other);
            other
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    uvmap_core::init()?;
    let cli = Cli::parse();

    let (config, _validation) = load_config()?;
    let app = App::new(config)?;

    match cli.command {
        Command::Resolve { lat, lng } => {
            let map = &app.config().map;
            let coords = Coordinates::new(
                lat.unwrap_or(map.default_lat),
                lng.unwrap_or(map.default_lng),
            );
            resolve_and_print(&app, coords).await;
        }
        Command::Comment { lat, lng, uv, text } => {
            app.session().set_draft(text.clone());
            let outcome = app
                .annotations()
                .submit(app.session(), &text, uv, Coordinates::new(lat, lng), now_ms())
                .await;
            report_submit(&outcome);
        }
        Command::Note { lat, lng, uv, text } => {
            let outcome = app
                .annotations()
                .save_standalone(app.session(), &text, uv, Coordinates::new(lat, lng), now_ms())
                .await;
            report_submit(&outcome);
        }
        Command::List => print_annotations(&app).await,
        Command::Delete { id } => delete_and_report(&app, &id).await,
        Command::Export { path } => match export::export_store(app.store().as_ref(), &path).await {
            Ok(rows) => println!("{} registros exportados a {}", rows, path.display()),
            Err(e) => {
                let err = AppError::from(e);
                tracing::error!("Error exporting data: {}", err);
                eprintln!("{}", err.user_message());
            }
        },
        Command::Shell => shell::run(&app).await?,
    }

    Ok(())
}
