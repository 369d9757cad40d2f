//! Configuration schema for vapp
//!
//! Configuration is stored at `~/.config/vapp/config.toml`. Everything has
//! a working default; the file only needs to exist to override something.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,

    /// Python toolchain settings
    pub toolchain: ToolchainConfig,

    /// Launch settings
    pub launch: LaunchConfig,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root override (default: `~/.cache/vapp/apps`)
    pub root: Option<PathBuf>,

    /// Max seconds to wait for another process's install to finish
    pub lock_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            lock_timeout_secs: 600,
        }
    }
}

impl CacheConfig {
    /// Resolve the effective cache root.
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("vapp")
                .join("apps")
        })
    }
}

/// Python toolchain settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Interpreter used to create environments
    pub python: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
        }
    }
}

/// Launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Fall back to the ambient PATH when a command is not found in the
    /// app environment (default: strict isolation, no fallback)
    pub allow_system_path: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            allow_system_path: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[toolchain]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.toolchain.python, "python3");
        assert_eq!(config.cache.lock_timeout_secs, 600);
        assert!(!config.launch.allow_system_path);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [toolchain]
            python = "/opt/py/bin/python3.12"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.toolchain.python, "/opt/py/bin/python3.12");
        assert_eq!(config.cache.lock_timeout_secs, 600); // default preserved
    }

    #[test]
    fn resolved_root_honors_override() {
        let config = CacheConfig {
            root: Some(PathBuf::from("/tmp/elsewhere")),
            ..CacheConfig::default()
        };
        assert_eq!(config.resolved_root(), PathBuf::from("/tmp/elsewhere"));
    }
}
