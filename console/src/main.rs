//! Flux Action - Entry Point
//!
//! Manage remote automation workflows through four configurable webhooks.

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use tracing::debug;

use flux_action::app::options::{parse_args, Command, USAGE};
use flux_action::app::run::{build_context, run_command};
use flux_action::logs::{init_logging, LogOptions};
use flux_action::storage::layout::StorageLayout;
use flux_action::storage::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let args = parse_args(env::args().skip(1));
    let command = match Command::from_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e.to_string().red(), USAGE);
            return ExitCode::from(2);
        }
    };

    let layout = StorageLayout::default();
    let settings = Settings::load(&layout.settings_file()).await;

    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_to_file.then(|| layout.logs_dir().path().to_path_buf()),
        json_format: settings.json_logs,
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };
    debug!("Using storage at {:?}", layout.base_dir);

    let mut ctx = match build_context(&layout, &settings).await {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let is_download = matches!(command, Command::Download { .. });
    match run_command(command, &mut ctx).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) if is_download => {
            eprintln!("{} {}", "Error downloading workflow:".red().bold(), e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
