//! Environment provisioning
//!
//! Turns a package spec into a ready-to-launch isolated environment:
//! the builder owns the cache state machine, the toolchain trait hides
//! the interpreter-specific work behind it.

mod builder;
mod python;
mod toolchain;

pub use builder::{EnsureOptions, EnsureOutcome, EnvBuilder};
pub use python::PythonToolchain;
pub use toolchain::{create_toolchain, EnvHandle, InstallMode, Toolchain};

/// Max number of output lines to include in install error messages.
const INSTALL_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of installer output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last
/// `INSTALL_ERROR_TAIL_LINES` lines so error messages are actionable
/// without being overwhelming.
pub(crate) fn install_error_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > INSTALL_ERROR_TAIL_LINES {
        lines[total - INSTALL_ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}
