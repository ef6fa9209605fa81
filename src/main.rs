mod app;
mod config;
mod error;
mod input;
mod store;
mod ui;
mod wifi;

use clap::Parser;
use color_eyre::eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    app::{App, Command},
    config::{Config, IconSet},
    input::{ConsoleNotifier, ConsolePrompt},
    wifi::{BackendKind, Dispatcher, ProcessRunner, backend},
};

/// Manage Wi-Fi from the terminal through NetworkManager or iwd
#[derive(Parser, Debug)]
#[command(
    name = "wifi-commander",
    about = "Manage Wi-Fi from the terminal through NetworkManager (nmcli) or iwd (iwctl).",
    long_about = None,
    version = env!("CARGO_PKG_VERSION"),
    disable_version_flag = true
)]
struct Args {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Network daemon to drive, overriding the config file
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendKind>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Use ASCII icons (no Nerd Fonts required)
    #[arg(long, global = true)]
    ascii: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wifi_commander={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.debug);

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(kind) = args.backend {
        config.backend = kind;
    }
    debug!(config = %config_path.display(), "configuration loaded");

    let prompt = match &args.command {
        Command::Connect {
            username, password, ..
        } => ConsolePrompt::new(username.clone(), password.clone()),
        _ => ConsolePrompt::new(None, None),
    };
    let notifier = Arc::new(ConsoleNotifier);
    let backend = backend::build(config.backend, Arc::new(ProcessRunner), config.command_timeout());
    debug!(backend = backend.kind().program(), "backend ready");
    let dispatcher = Dispatcher::new(backend, notifier.clone(), Arc::new(prompt));

    let icons = if args.ascii { IconSet::Ascii } else { IconSet::Nerd };
    let mut app = App::new(dispatcher, notifier, config, icons);

    match app.run(args.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            debug!(error = ?e, "command failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
