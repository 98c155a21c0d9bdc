// Pulse Library
// Focus session tracking: timer state machine, session store and statistics

pub mod analytics;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod storage;
pub mod store;
pub mod timer;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, warn};

use commands::{Cli, CommandContext};
use config::Settings;
use error::AppError;

/// Parse arguments, run one command and report its outcome
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let data_dir = cli.resolved_data_dir();
    let (settings, settings_error) = load_settings(&data_dir);
    let _log_guard = logging::init_logging(&settings.log);
    if let Some(e) = settings_error {
        warn!(code = e.code(), error = %e, "Settings not loaded, using defaults");
    }
    let json = cli.json;

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return report(&AppError::from(e), json),
    };

    let result = runtime.block_on(async {
        let ctx = CommandContext::open(&data_dir, settings, json)?;
        commands::execute(cli.command, &ctx).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, json),
    }
}

/// Settings for `data_dir`, or defaults plus the load error to log later
fn load_settings(data_dir: &Path) -> (Settings, Option<AppError>) {
    match Settings::load(data_dir) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    }
}

fn report(e: &AppError, json: bool) -> ExitCode {
    debug!(code = e.code(), error = %e, "Command failed");
    if json {
        match serde_json::to_string(e) {
            Ok(rendered) => eprintln!("{rendered}"),
            Err(_) => eprintln!("error: {e}"),
        }
    } else {
        eprintln!("error: {e}");
    }
    ExitCode::FAILURE
}
