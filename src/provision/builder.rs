//! Environment builder
//!
//! Drives a cache entry from whatever state it is in to Ready: takes the
//! entry lock, decides whether the cached environment can be reused, and
//! otherwise runs the toolchain build with marker bookkeeping around it.

use crate::cache::{CacheState, CacheStore, EntryLock};
use crate::error::VappResult;
use crate::pkgspec::{AppName, PackageSpec};
use crate::provision::toolchain::{InstallMode, Toolchain};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Knobs for one ensure pass
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureOptions {
    /// Refresh the environment to current releases even if it is ready
    pub update: bool,
    /// Discard any cached environment and build from scratch
    pub clean: bool,
}

/// What an ensure pass produced
#[derive(Debug, Clone)]
pub struct EnsureOutcome {
    /// Executable root of the ready environment
    pub exec_root: PathBuf,
    /// Whether this pass ran a build (false: reused the cache as-is)
    pub built: bool,
}

/// Builds and maintains per-app environments over a cache store.
pub struct EnvBuilder {
    store: CacheStore,
    toolchain: Box<dyn Toolchain>,
    lock_timeout: Duration,
}

impl EnvBuilder {
    /// Create a builder over the given store and toolchain
    pub fn new(store: CacheStore, toolchain: Box<dyn Toolchain>, lock_timeout: Duration) -> Self {
        Self {
            store,
            toolchain,
            lock_timeout,
        }
    }

    /// The underlying cache store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Make the entry for `name` ready, building it if needed.
    ///
    /// Exactly one process builds a given entry at a time; latecomers wait
    /// on the entry lock and then reuse the freshly built environment. A
    /// failed build rolls the entry back before the error is returned.
    pub async fn ensure(
        &self,
        name: &AppName,
        spec: &PackageSpec,
        options: EnsureOptions,
    ) -> VappResult<EnsureOutcome> {
        let _lock = EntryLock::acquire(&self.store, name, self.lock_timeout).await?;

        if options.clean {
            info!("Discarding cached environment for {}", name);
            self.store.purge(name)?;
        }

        let state = self.store.state(name)?;
        if state == CacheState::Ready && !options.update {
            if let Some(marker) = self.store.ready_marker(name)? {
                if marker.spec != *spec {
                    warn!(
                        "'{}' was built from '{}'; reusing it for '{}'",
                        name, marker.spec, spec
                    );
                }
                debug!("{} is already ready", name);
                return Ok(EnsureOutcome {
                    exec_root: marker.exec_root,
                    built: false,
                });
            }
        }

        // We hold the entry lock, so a building marker here is leftover
        // from an interrupted build (a live-looking pid is just pid reuse).
        if matches!(state, CacheState::Stale | CacheState::Building) {
            info!("Discarding interrupted build of {}", name);
            self.store.purge(name)?;
        }

        self.toolchain.ensure_ready().await?;
        self.store.mark_building(name, spec)?;

        match self.build(name, spec, options).await {
            Ok(exec_root) => {
                self.store.mark_ready(name, spec, &exec_root)?;
                info!("{} is ready", name);
                Ok(EnsureOutcome {
                    exec_root,
                    built: true,
                })
            }
            Err(e) => {
                if let Err(cleanup) = self.store.mark_failed(name) {
                    warn!("Rolling back {} failed: {}", name, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn build(
        &self,
        name: &AppName,
        spec: &PackageSpec,
        options: EnsureOptions,
    ) -> VappResult<PathBuf> {
        let runtime_dir = self.store.runtime_dir(name);
        let mode = if options.update {
            InstallMode::Upgrade
        } else {
            InstallMode::Fresh
        };
        debug!(
            "Building {} with the {} toolchain",
            name,
            self.toolchain.toolchain_name()
        );

        let env = self
            .toolchain
            .create_env(&runtime_dir, spec, options.clean)
            .await?;
        self.toolchain.install(&env, spec, mode).await?;
        Ok(env.exec_root())
    }
}
