//! Per-entry advisory locks
//!
//! An exclusive OS file lock on a sibling `.lock` file serializes
//! building transitions for one entry. The kernel releases the lock when
//! the holding process exits for any reason, so a crashed builder never
//! wedges the entry; its leftover marker is detected as stale instead.

use crate::cache::store::CacheStore;
use crate::error::{VappError, VappResult};
use crate::pkgspec::AppName;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Exclusive hold on one cache entry's building transition.
///
/// Released when dropped (closing the file releases the OS lock). The
/// lock file itself is left in place; unlinking it would let a later
/// acquirer lock a fresh inode while the old one is still held.
#[derive(Debug)]
pub struct EntryLock {
    file: File,
    path: PathBuf,
}

impl EntryLock {
    /// Acquire the entry lock, polling until `timeout` elapses.
    ///
    /// Returns [`VappError::LockTimeout`] if another process still holds
    /// the lock when the deadline passes.
    pub async fn acquire(
        store: &CacheStore,
        name: &AppName,
        timeout: Duration,
    ) -> VappResult<Self> {
        store.ensure_root()?;
        let path = store.lock_path(name);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| VappError::io(format!("opening lock file {}", path.display()), e))?;

        let started = Instant::now();
        let mut announced = false;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!("Acquired lock {}", path.display());
                    return Ok(Self { file, path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if started.elapsed() >= timeout {
                        return Err(VappError::LockTimeout {
                            name: name.to_string(),
                            waited_secs: timeout.as_secs(),
                        });
                    }
                    if !announced {
                        info!("Waiting for another process working on '{}'...", name);
                        announced = true;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(e) => {
                    return Err(VappError::io(
                        format!("locking {}", path.display()),
                        e,
                    ))
                }
            }
        }
    }

    /// Path of the underlying lock file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("Releasing lock {} failed: {}", self.path.display(), e);
        }
    }
}
