//! Run command - install if needed, then launch an app command

use crate::cache::CacheStore;
use crate::cli::args::RunArgs;
use crate::config::Config;
use crate::error::VappResult;
use crate::launch::Launcher;
use crate::pkgspec::{AppName, PackageSpec};
use crate::provision::{create_toolchain, EnsureOptions, EnvBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

/// Execute the run command, returning the app's exit code
pub async fn execute(args: RunArgs, config: &Config, show_output: bool) -> VappResult<i32> {
    let spec = PackageSpec::parse(&args.spec)?;
    let name = AppName::resolve(&spec, args.name.as_deref())?;
    debug!("Resolved '{}' to app '{}'", spec, name);

    let store = CacheStore::new(config.cache.resolved_root());
    let options = EnsureOptions {
        update: args.update,
        clean: args.clean,
    };

    // Unlocked peek purely for output cosmetics: a warm run stays silent
    let probably_warm = store.state(&name)?.is_ready() && !options.update && !options.clean;
    let pb = if show_output || probably_warm {
        None
    } else {
        Some(create_progress_bar(&format!("Preparing {}...", name)))
    };

    let toolchain = create_toolchain(config, show_output);
    let builder = EnvBuilder::new(
        store,
        toolchain,
        Duration::from_secs(config.cache.lock_timeout_secs),
    );

    let result = builder.ensure(&name, &spec, options).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let outcome = result?;

    let Some((command, command_args)) = args.command.split_first() else {
        debug!("No command given; {} is ready", name);
        return Ok(0);
    };

    let launcher = Launcher::new(config.launch.clone());
    launcher.run(&outcome.exec_root, command, command_args).await
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
