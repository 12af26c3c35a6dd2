mod commands;
mod config;
mod response;

use std::env;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use commands::{bundle, patch, steam};
use config::FgmodConfig;
use response::Response;

const SKIP_UPSCALER_ENV: &str = "DECKY_SKIP_UPSCALER_OVERWRITE";

#[derive(Parser, Debug)]
#[command(
    name = "fgmod",
    version,
    about = "Install the OptiScaler bundle and patch game directories with it"
)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/fgmod/fgmod.toml)
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Pretty-print the JSON response
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build ~/fgmod from the plugin's OptiScaler archive
    Install {
        /// Keep the archive's upscaler library instead of the standalone copy
        #[arg(long, action = clap::ArgAction::SetTrue)]
        skip_upscaler_overwrite: bool,
    },
    /// Delete the installed bundle
    Remove,
    /// Report whether a complete bundle is installed
    CheckBundle,
    /// Copy OptiScaler into a game directory
    Patch { directory: String },
    /// Remove OptiScaler from a game directory and restore originals
    Unpatch { directory: String },
    /// Show whether a game directory is patched and which backups exist
    Status { directory: String },
    /// List installed Steam games that can be patched
    ListGames,
    /// Print the home directory and default Steam library root
    PathDefaults,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let response = match FgmodConfig::load(cli.config.as_deref()) {
        Ok(cfg) => dispatch(&cfg, cli.command),
        Err(err) => {
            error!(error = ?err, "failed to load config");
            Response::error(format!("{err:#}"))
        }
    };

    response.print(cli.pretty);
    if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn dispatch(cfg: &FgmodConfig, command: Commands) -> Response {
    match command {
        Commands::Install {
            skip_upscaler_overwrite,
        } => bundle::install(cfg, skip_upscaler_overwrite || env_flag(SKIP_UPSCALER_ENV)),
        Commands::Remove => bundle::remove(cfg),
        Commands::CheckBundle => bundle::check(cfg),
        Commands::Patch { directory } => patch::patch(cfg, &directory),
        Commands::Unpatch { directory } => patch::unpatch(cfg, &directory),
        Commands::Status { directory } => patch::status(cfg, &directory),
        Commands::ListGames => steam::list_games(cfg),
        Commands::PathDefaults => steam::path_defaults(cfg),
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|value| is_truthy(&value))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

// Logs go to stderr; stdout carries only the JSON response.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
