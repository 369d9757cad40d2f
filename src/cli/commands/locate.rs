//! Locate command - print where an app is installed

use crate::cache::{CacheState, CacheStore};
use crate::cli::args::LocateArgs;
use crate::config::Config;
use crate::error::{VappError, VappResult};

/// Execute the locate command
pub async fn execute(args: LocateArgs, config: &Config) -> VappResult<()> {
    let store = CacheStore::new(config.cache.resolved_root());
    let name = store.resolve_name(&args.app)?;
    if store.state(&name)? == CacheState::Absent {
        return Err(VappError::AppNotFound {
            name: name.to_string(),
        });
    }

    // Plain paths on stdout so the output is usable in scripts
    if args.bin {
        let exec_root = match store.ready_marker(&name)? {
            Some(marker) => marker.exec_root,
            None => store.runtime_dir(&name).join("bin"),
        };
        println!("{}", exec_root.display());
    } else {
        println!("{}", store.entry_path(&name).display());
    }

    Ok(())
}
