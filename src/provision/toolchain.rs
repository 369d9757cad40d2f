//! Toolchain abstraction
//!
//! Provides a trait for the interpreter-specific work of building an
//! isolated environment, so the builder and tests do not depend on a
//! real interpreter being installed.

use crate::config::Config;
use crate::error::VappResult;
use crate::pkgspec::PackageSpec;
use crate::provision::python::PythonToolchain;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// How a package lands in an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// First install into a new environment
    Fresh,
    /// Refresh an existing environment to current releases
    Upgrade,
}

/// Handle to one isolated environment on disk
#[derive(Debug, Clone)]
pub struct EnvHandle {
    root: PathBuf,
}

impl EnvHandle {
    /// Wrap an environment rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The environment's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the environment's executables land in
    pub fn exec_root(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// The environment's own interpreter
    pub fn python_path(&self) -> PathBuf {
        self.exec_root().join("python")
    }

    /// The environment's own installer
    pub fn pip_path(&self) -> PathBuf {
        self.exec_root().join("pip")
    }
}

/// Abstract environment toolchain interface
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Check that the toolchain can build environments on this system
    async fn ensure_ready(&self) -> VappResult<()>;

    /// Create (or reuse) an isolated environment rooted at `dir`.
    ///
    /// With `recreate` set, any prior contents of the environment are
    /// discarded first. The spec is only used for error context.
    async fn create_env(
        &self,
        dir: &Path,
        spec: &PackageSpec,
        recreate: bool,
    ) -> VappResult<EnvHandle>;

    /// Install the package identified by `spec` into the environment
    async fn install(
        &self,
        env: &EnvHandle,
        spec: &PackageSpec,
        mode: InstallMode,
    ) -> VappResult<()>;

    /// Human-readable toolchain name for display
    fn toolchain_name(&self) -> &'static str;
}

/// Create the toolchain for the configured interpreter
///
/// With `show_output` set, installer output streams to the terminal
/// instead of being captured for error reporting.
pub fn create_toolchain(config: &Config, show_output: bool) -> Box<dyn Toolchain> {
    Box::new(PythonToolchain::new(&config.toolchain.python, show_output))
}
