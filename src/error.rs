//! Error types for vapp
//!
//! All modules use `VappResult<T>` as their return type. A nonzero exit
//! status from a launched application is not an error; only failures to
//! reach the point of launch are.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vapp operations
pub type VappResult<T> = Result<T, VappError>;

/// All errors that can occur in vapp
#[derive(Error, Debug)]
pub enum VappError {
    // Input errors
    #[error("Invalid package spec '{spec}': {reason}")]
    InvalidPackageSpec { spec: String, reason: String },

    #[error("Invalid app name '{name}': {reason}")]
    InvalidAppName { name: String, reason: String },

    // Cache errors
    #[error("Timed out after {waited_secs}s waiting for the lock on app '{name}'")]
    LockTimeout { name: String, waited_secs: u64 },

    #[error("App is not installed: {name}")]
    AppNotFound { name: String },

    // Build errors
    #[error("Failed to install '{spec}': {reason}")]
    InstallFailed { spec: String, reason: String },

    #[error("Python toolchain not usable: {reason}")]
    ToolchainNotReady { reason: String },

    // Launch errors
    #[error("Command not found in app environment: {command} (looked in {exec_root})")]
    CommandNotFound { command: String, exec_root: PathBuf },

    #[error("Failed to launch command: {command}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VappError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an install failure wrapping an underlying toolchain error
    pub fn install_failed(spec: impl Into<String>, reason: impl ToString) -> Self {
        Self::InstallFailed {
            spec: spec.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::LockTimeout { .. } => {
                Some("Another install for this app may be in progress; retry in a moment")
            }
            Self::CommandNotFound { .. } => {
                Some("Check that the package provides this command, or rebuild with --update")
            }
            Self::AppNotFound { .. } => {
                Some("Run: vapp install <package> (or vapp list to see what is installed)")
            }
            Self::ToolchainNotReady { .. } => {
                Some("Install Python 3.7+ with the venv module, or set toolchain.python in the config")
            }
            Self::InstallFailed { .. } => {
                Some("Re-run with -v for full installer output, or retry with --clean")
            }
            _ => None,
        }
    }
}
