//! Mandala grid command-line front end.
//!
//! # Responsibility
//! - Open the chart store, apply one command, print the visible grid.
//! - Surface persistence failures without discarding the applied change.
//!
//! Usage: mandala [OPTIONS] <COMMAND>

mod render;

use clap::{Parser, Subcommand};
use log::info;
use mandala_core::db::open_db;
use mandala_core::{
    default_log_level, init_logging, ChartService, ChartServiceError, SqliteKeyValueStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_DB_FILE_NAME: &str = "mandala.sqlite3";

#[derive(Parser)]
#[command(
    name = "mandala",
    version = mandala_core::core_version(),
    about = "Recursive 3x3 brainstorming grid"
)]
struct Cli {
    /// SQLite database file holding the chart
    #[arg(long, default_value = DEFAULT_DB_FILE_NAME)]
    db: PathBuf,

    /// Directory for rolling log files (logging is off when omitted)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current grid
    Show,
    /// Set a cell's text (blank text restores the placeholder)
    Edit {
        cell_id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Restore a cell's placeholder text
    Clear { cell_id: String },
    /// Make a cell the center of the visible grid
    Expand { cell_id: String },
    /// Go up to the parent grid
    Back,
    /// Go to the main theme grid
    Root,
    /// Discard the chart and start over
    Reset,
    /// Print the loaded chart as JSON (a fresh chart when stored state was unusable)
    ExportJson,
    /// Print the share message for the current center
    Share,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = absolutize(log_dir);
        if let Err(err) = init_logging(level, &log_dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let conn = match open_db(&cli.db) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("error: cannot open {}: {err}", cli.db.display());
            return ExitCode::FAILURE;
        }
    };
    let store = match SqliteKeyValueStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut service = ChartService::open(store);

    let outcome = run(&mut service, &cli.command);
    info!("event=cli_command module=cli status=done");

    match outcome {
        Ok(Output::Grid(notice)) => {
            if let Some(notice) = notice {
                println!("{notice}");
            }
            print!("{}", render::render_chart(service.chart()));
            ExitCode::SUCCESS
        }
        Ok(Output::Text(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            print!("{}", render::render_chart(service.chart()));
            eprintln!("warning: {err}; change kept for this session only");
            ExitCode::from(2)
        }
    }
}

enum Output {
    Grid(Option<String>),
    Text(String),
}

fn run(
    service: &mut ChartService<SqliteKeyValueStore<'_>>,
    command: &Command,
) -> Result<Output, ChartServiceError> {
    let notice = |changed: bool, what: &str| (!changed).then(|| format!("nothing to do: {what}"));

    let output = match command {
        Command::Show => Output::Grid(None),
        Command::Edit { cell_id, text } => {
            let changed = service.commit_edit(cell_id, &text.join(" "))?;
            Output::Grid(notice(changed, &format!("unknown cell `{cell_id}`")))
        }
        Command::Clear { cell_id } => {
            let changed = service.commit_edit(cell_id, "")?;
            Output::Grid(notice(changed, &format!("unknown cell `{cell_id}`")))
        }
        Command::Expand { cell_id } => {
            let changed = service.expand(cell_id)?;
            Output::Grid(notice(
                changed,
                &format!("`{cell_id}` is unknown or already the center"),
            ))
        }
        Command::Back => {
            let changed = service.go_back()?;
            Output::Grid(notice(changed, "already at the main theme"))
        }
        Command::Root => {
            let changed = service.go_to_root()?;
            Output::Grid(notice(changed, "already at the main theme"))
        }
        Command::Reset => {
            service.reset()?;
            Output::Grid(Some("chart reset".to_string()))
        }
        Command::ExportJson => {
            Output::Text(service.chart().to_json().map_err(ChartServiceError::Encode)?)
        }
        Command::Share => Output::Text(service.chart().share_message()),
    };
    Ok(output)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
