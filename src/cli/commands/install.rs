//! Install command - build an app's cached environment

use crate::cache::CacheStore;
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::{VappError, VappResult};
use crate::pkgspec::{AppName, PackageSpec};
use crate::provision::{create_toolchain, EnsureOptions, EnvBuilder};
use crate::ui::{self, TaskSpinner, UiContext};
use std::time::Duration;
use tracing::debug;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config, show_output: bool) -> VappResult<()> {
    let ctx = UiContext::detect();

    let spec = PackageSpec::parse(&args.spec)?;
    let name = AppName::resolve(&spec, args.name.as_deref())?;
    debug!("Resolved '{}' to app '{}'", spec, name);

    let store = CacheStore::new(config.cache.resolved_root());
    let toolchain = create_toolchain(config, show_output);
    let builder = EnvBuilder::new(
        store,
        toolchain,
        Duration::from_secs(config.cache.lock_timeout_secs),
    );

    // With streamed installer output a spinner would garble the terminal
    let mut spinner = TaskSpinner::new(&ctx);
    if !show_output {
        spinner.start(&format!("Installing {}...", name));
    }

    let options = EnsureOptions {
        update: args.update,
        clean: args.clean,
    };
    let outcome = match builder.ensure(&name, &spec, options).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if !show_output {
                spinner.stop_error(&format!("Install of {} failed", name));
            }
            return Err(e);
        }
    };

    match (show_output, outcome.built) {
        (false, true) => spinner.stop(&format!("Installed {}", name)),
        (false, false) => spinner.stop(&format!("{} is already installed", name)),
        (true, true) => ui::step_ok(&ctx, &format!("Installed {}", name)),
        (true, false) => ui::step_info(&ctx, &format!("{} is already installed", name)),
    }
    ui::remark(&ctx, &format!("Commands in {}", outcome.exec_root.display()));

    if let Some(ref path_file) = args.app_path_file {
        std::fs::write(path_file, outcome.exec_root.display().to_string()).map_err(|e| {
            VappError::io(format!("writing app path to {}", path_file.display()), e)
        })?;
        debug!("Wrote app path to {}", path_file.display());
    }

    Ok(())
}
