use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "chaosgame",
    author,
    version,
    about = "Chaotic attractor point-cloud renderer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Preset to render: a built-in name, a user preset name, or a path to a TOML file.
    #[arg(value_name = "PRESET")]
    pub preset: Option<String>,

    /// Override the window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Override the number of points drawn per frame.
    #[arg(long, value_name = "COUNT")]
    pub particles: Option<usize>,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Quit automatically after this long (e.g. `30s`, `2m`).
    #[arg(long, value_name = "DURATION", value_parser = parse_run_for)]
    pub run_for: Option<Duration>,

    /// Image used as the glow sprite for every point.
    #[arg(long, value_name = "PATH")]
    pub glow: Option<PathBuf>,

    /// Override the window title.
    #[arg(long, value_name = "TITLE")]
    pub window_title: Option<String>,

    /// Validate the resolved preset and exit without opening a window.
    #[arg(long)]
    pub check: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect built-in and user presets.
    Presets(PresetsCommand),
}

#[derive(Parser, Debug)]
pub struct PresetsCommand {
    #[command(subcommand)]
    pub action: PresetsAction,
}

#[derive(Subcommand, Debug)]
pub enum PresetsAction {
    /// List built-in presets and presets found in the user directory.
    List,
    /// Print a resolved preset as TOML (or JSON with `--json`).
    Show(ShowArgs),
    /// Print the directory searched for user presets.
    Where,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Preset name or path.
    #[arg(value_name = "PRESET")]
    pub preset: String,

    /// Emit JSON instead of TOML.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_run_for(value: &str) -> Result<Duration, String> {
    let duration = chaosconfig::parse_duration(value).map_err(|err| err.to_string())?;
    if duration.is_zero() {
        return Err("run duration must be greater than zero".to_string());
    }
    Ok(duration)
}
