//! App launcher
//!
//! Resolves a command inside a built environment's executable root,
//! applies virtualenv-style activation to the child's environment, and
//! relays the app's exit status verbatim.

use crate::config::schema::LaunchConfig;
use crate::error::{VappError, VappResult};
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Launches commands from built environments
pub struct Launcher {
    config: LaunchConfig,
}

impl Launcher {
    /// Create a launcher with the given launch configuration
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    /// Resolve `command` to an executable under `exec_root`.
    ///
    /// Resolution stays inside the environment unless the configuration
    /// allows falling back to the ambient search path. Absolute paths and
    /// parent traversal never resolve; isolation is the point.
    pub fn resolve_command(&self, exec_root: &Path, command: &str) -> VappResult<PathBuf> {
        if is_plain_command(command) {
            let candidate = exec_root.join(command);
            if candidate.is_file() {
                return Ok(candidate);
            }

            if self.config.allow_system_path {
                if let Some(found) = search_ambient_path(command) {
                    debug!(
                        "'{}' not in {}; using {} from PATH",
                        command,
                        exec_root.display(),
                        found.display()
                    );
                    return Ok(found);
                }
            }
        }

        Err(VappError::CommandNotFound {
            command: command.to_string(),
            exec_root: exec_root.to_path_buf(),
        })
    }

    /// Run `command` from the environment rooted above `exec_root`,
    /// relaying stdio and returning the child's exit code.
    ///
    /// A nonzero exit is the app's business, not an error; only failing
    /// to start the child at all reports [`VappError::Launch`].
    pub async fn run(
        &self,
        exec_root: &Path,
        command: &str,
        args: &[String],
    ) -> VappResult<i32> {
        let program = self.resolve_command(exec_root, command)?;
        let venv_root = exec_root.parent().unwrap_or(exec_root);

        info!("Launching {}", program.display());
        let vars = activation_vars(venv_root, exec_root, std::env::vars_os().collect());

        let status = Command::new(&program)
            .args(args)
            .env_clear()
            .envs(vars)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| VappError::Launch {
                command: program.display().to_string(),
                source: e,
            })?;

        let code = exit_code_of(&status);
        debug!("{} exited with code {}", program.display(), code);
        Ok(code)
    }
}

/// Exit code of a finished child, encoding signal deaths the way shells
/// do (128 + signal number).
#[cfg(unix)]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// A command that resolves inside an exec root: relative, no traversal
fn is_plain_command(command: &str) -> bool {
    let path = Path::new(command);
    !command.is_empty()
        && !path.is_absolute()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn search_ambient_path(command: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}

/// Compute the child's environment: virtualenv-style activation applied
/// over the given base variables.
///
/// Any prior activation is undone first (its bin directory leaves PATH,
/// its markers are dropped), then `exec_root` is prepended to PATH and
/// VIRTUAL_ENV set to the environment root.
pub(crate) fn activation_vars(
    venv_root: &Path,
    exec_root: &Path,
    base: Vec<(OsString, OsString)>,
) -> Vec<(OsString, OsString)> {
    let prior_bin: Option<PathBuf> = base
        .iter()
        .find(|(key, _)| key == "VIRTUAL_ENV")
        .map(|(_, value)| PathBuf::from(value).join("bin"));

    let mut vars = Vec::with_capacity(base.len() + 2);
    let mut saw_path = false;
    for (key, value) in base {
        if key == "VIRTUAL_ENV" || key == "POETRY_ACTIVE" {
            continue;
        }
        if key == "PATH" {
            saw_path = true;
            let activated = activated_search_path(&value, exec_root, prior_bin.as_deref());
            vars.push((key, activated));
        } else {
            vars.push((key, value));
        }
    }
    if !saw_path {
        vars.push((OsString::from("PATH"), exec_root.as_os_str().to_os_string()));
    }
    vars.push((
        OsString::from("VIRTUAL_ENV"),
        venv_root.as_os_str().to_os_string(),
    ));
    vars
}

fn activated_search_path(
    current: &OsStr,
    exec_root: &Path,
    prior_bin: Option<&Path>,
) -> OsString {
    let parts: Vec<PathBuf> = std::env::split_paths(current)
        .filter(|dir| !dir.as_os_str().is_empty())
        .filter(|dir| Some(dir.as_path()) != prior_bin)
        .collect();

    // Keep an already-listed exec root where it is instead of promoting it
    let mut activated = Vec::with_capacity(parts.len() + 1);
    if !parts.iter().any(|dir| dir == exec_root) {
        activated.push(exec_root.to_path_buf());
    }
    activated.extend(parts);

    std::env::join_paths(activated).unwrap_or_else(|_| current.to_os_string())
}
