//! Uninstall command - remove an app's cached environment

use crate::cache::{CacheState, CacheStore, EntryLock};
use crate::cli::args::UninstallArgs;
use crate::config::Config;
use crate::error::{VappError, VappResult};
use crate::ui::{self, UiContext};
use std::time::Duration;
use tracing::debug;

/// Execute the uninstall command
pub async fn execute(args: UninstallArgs, config: &Config) -> VappResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);

    let store = CacheStore::new(config.cache.resolved_root());
    let name = store.resolve_name(&args.app)?;
    if store.state(&name)? == CacheState::Absent {
        return Err(VappError::AppNotFound {
            name: name.to_string(),
        });
    }

    if !ui::confirm(&ctx, &format!("Remove app '{}'?", name), true).await? {
        ui::step_info(&ctx, "Nothing removed");
        return Ok(());
    }

    // Taking the entry lock keeps us from ripping out an in-flight build
    let _lock = EntryLock::acquire(
        &store,
        &name,
        Duration::from_secs(config.cache.lock_timeout_secs),
    )
    .await?;
    store.purge(&name)?;
    debug!("Purged {}", name);

    ui::outro_success(&ctx, &format!("Removed {}", name));
    Ok(())
}
