//! Vapp - virtual Python application runner
//!
//! Installs pip-installable tools into per-app cached environments and
//! runs their commands without touching the system Python.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod pkgspec;
pub mod provision;
pub mod ui;

pub use error::{VappError, VappResult};
