//! Vapp - virtual Python application runner
//!
//! CLI entry point that dispatches to subcommands. The process exit code
//! mirrors a launched app's exit code for `vapp run`.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vapp::cli::{Cli, Commands};
use vapp::config::ConfigManager;
use vapp::error::VappResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> VappResult<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("vapp=warn"),
        1 => EnvFilter::new("vapp=info"),
        _ => EnvFilter::new("vapp=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Version needs no configuration
    if matches!(cli.command, Commands::Version) {
        vapp::cli::commands::version().await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let mut config = config_manager.load().await?;

    if let Some(cache_dir) = cli.cache_dir {
        config.cache.root = Some(cache_dir);
    }

    // At -v and up, stream installer output instead of capturing it
    let show_output = cli.verbose > 0;

    // Dispatch to command
    match cli.command {
        Commands::Version => unreachable!("Version handled above"),
        Commands::Install(args) => {
            vapp::cli::commands::install(args, &config, show_output).await?;
        }
        Commands::Run(args) => {
            let code = vapp::cli::commands::run(args, &config, show_output).await?;
            return Ok(ExitCode::from(code.clamp(0, 255) as u8));
        }
        Commands::List(args) => vapp::cli::commands::list(args, &config).await?,
        Commands::Locate(args) => vapp::cli::commands::locate(args, &config).await?,
        Commands::Uninstall(args) => vapp::cli::commands::uninstall(args, &config).await?,
    }

    Ok(ExitCode::SUCCESS)
}
