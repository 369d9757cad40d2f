//! Python venv toolchain
//!
//! Implements the Toolchain trait by shelling out to a Python
//! interpreter: `python -m venv` for environment creation and the
//! environment's own pip for installation.

use crate::error::{VappError, VappResult};
use crate::pkgspec::PackageSpec;
use crate::provision::install_error_tail;
use crate::provision::toolchain::{EnvHandle, InstallMode, Toolchain};
use async_trait::async_trait;
use semver::{Version, VersionReq};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Interpreter versions known to ship a usable venv + pip combination
const SUPPORTED_PYTHON: &str = ">=3.7";

/// Environment toolchain backed by `python -m venv` and pip
pub struct PythonToolchain {
    python: String,
    show_output: bool,
}

impl PythonToolchain {
    /// Create a toolchain using the given interpreter command
    pub fn new(python: impl Into<String>, show_output: bool) -> Self {
        Self {
            python: python.into(),
            show_output,
        }
    }

    /// Run one toolchain step, surfacing failures as install errors.
    ///
    /// Output is captured and only the failing tail is reported, unless
    /// `show_output` streams everything to the terminal instead.
    async fn run_step(
        &self,
        mut command: Command,
        step: &str,
        spec: &PackageSpec,
    ) -> VappResult<()> {
        debug!("Executing: {}", step);
        command.stdin(Stdio::null());

        if self.show_output {
            let status = command
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(|e| {
                    VappError::install_failed(spec.as_str(), format!("could not run {step}: {e}"))
                })?;
            if status.success() {
                return Ok(());
            }
            return Err(VappError::install_failed(
                spec.as_str(),
                format!("{} exited with {}", step, describe_exit(status.code())),
            ));
        }

        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                VappError::install_failed(spec.as_str(), format!("could not run {step}: {e}"))
            })?;
        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(VappError::install_failed(
            spec.as_str(),
            format!(
                "{} exited with {}:\n{}",
                step,
                describe_exit(output.status.code()),
                install_error_tail(&stdout, &stderr)
            ),
        ))
    }
}

#[async_trait]
impl Toolchain for PythonToolchain {
    async fn ensure_ready(&self) -> VappResult<()> {
        let output = Command::new(&self.python)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => VappError::ToolchainNotReady {
                    reason: format!("interpreter '{}' not found on PATH", self.python),
                },
                _ => VappError::io(format!("running {} --version", self.python), e),
            })?;

        if !output.status.success() {
            return Err(VappError::ToolchainNotReady {
                reason: format!(
                    "'{} --version' exited with {}",
                    self.python,
                    describe_exit(output.status.code())
                ),
            });
        }

        // Old interpreters print the version on stderr
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let banner = if stdout.trim().is_empty() {
            stderr.trim().to_string()
        } else {
            stdout.trim().to_string()
        };

        let supported =
            VersionReq::parse(SUPPORTED_PYTHON).expect("static version requirement parses");
        match parse_python_version(&banner) {
            Some(version) if !supported.matches(&version) => Err(VappError::ToolchainNotReady {
                reason: format!(
                    "'{}' is Python {}, but {} is required",
                    self.python, version, SUPPORTED_PYTHON
                ),
            }),
            Some(version) => {
                debug!("Using {} (Python {})", self.python, version);
                Ok(())
            }
            None => {
                warn!(
                    "Could not parse interpreter version from {:?}; continuing",
                    banner
                );
                Ok(())
            }
        }
    }

    async fn create_env(
        &self,
        dir: &Path,
        spec: &PackageSpec,
        recreate: bool,
    ) -> VappResult<EnvHandle> {
        info!("Preparing environment in {}", dir.display());

        let mut command = Command::new(&self.python);
        command.args(["-m", "venv"]);
        if recreate {
            command.arg("--clear");
        }
        command.arg(dir);
        self.run_step(command, "python -m venv", spec).await?;

        let env = EnvHandle::new(dir);
        if !env.pip_path().exists() {
            // Some distro interpreters build venvs without bundled pip
            let mut command = Command::new(env.python_path());
            command.args(["-m", "ensurepip"]);
            self.run_step(command, "python -m ensurepip", spec).await?;
        }
        Ok(env)
    }

    async fn install(
        &self,
        env: &EnvHandle,
        spec: &PackageSpec,
        mode: InstallMode,
    ) -> VappResult<()> {
        let pip = env.pip_path();

        if mode == InstallMode::Upgrade {
            let mut command = Command::new(&pip);
            command.args(["install", "--upgrade", "pip"]);
            self.run_step(command, "pip install --upgrade pip", spec)
                .await?;
        }

        // Wheel support is needed to build a fair number of sdists
        let mut command = Command::new(&pip);
        command.arg("install");
        if mode == InstallMode::Upgrade {
            command.arg("--upgrade");
        }
        command.arg("wheel");
        self.run_step(command, "pip install wheel", spec).await?;

        info!("Installing {}", spec);
        let mut command = Command::new(&pip);
        command.arg("install");
        if mode == InstallMode::Upgrade {
            command.args(["--upgrade", "--upgrade-strategy", "eager"]);
        }
        command.arg(spec.as_str());
        self.run_step(command, "pip install", spec).await
    }

    fn toolchain_name(&self) -> &'static str {
        "Python venv"
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Parse "Python 3.12.4" (including dev suffixes like "3.13.0a4")
fn parse_python_version(banner: &str) -> Option<Version> {
    let token = banner.strip_prefix("Python")?.trim().split_whitespace().next()?;

    let mut parts = [0u64; 3];
    for (i, part) in token.splitn(3, '.').enumerate() {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            if i == 0 {
                return None;
            }
            break;
        }
        parts[i] = digits.parse().ok()?;
    }
    Some(Version::new(parts[0], parts[1], parts[2]))
}
