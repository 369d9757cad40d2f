//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Vapp - virtual Python application runner
///
/// Installs pip-installable tools into per-app cached environments and
/// runs their commands without touching the system Python.
#[derive(Parser, Debug)]
#[command(name = "vapp")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info + installer output, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VAPP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root directory override
    #[arg(long, global = true, env = "VAPP_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the vapp version
    Version,

    /// Install an app into its cached environment
    Install(InstallArgs),

    /// Run a command from an app, installing it first if needed
    Run(RunArgs),

    /// List installed apps
    List(ListArgs),

    /// Print where an app is installed
    Locate(LocateArgs),

    /// Remove an installed app
    Uninstall(UninstallArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Package to install: a pip requirement, URL, or local path
    pub spec: String,

    /// App name override (default: derived from the spec)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Upgrade the app and its dependencies to current releases
    #[arg(short, long)]
    pub update: bool,

    /// Discard any cached environment and build from scratch
    #[arg(long)]
    pub clean: bool,

    /// Write the app's executable directory to this file
    #[arg(long)]
    pub app_path_file: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Package to run from: a pip requirement, URL, or local path
    pub spec: String,

    /// App name override (default: derived from the spec)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Upgrade the app before running
    #[arg(short, long)]
    pub update: bool,

    /// Discard any cached environment and build from scratch first
    #[arg(long)]
    pub clean: bool,

    /// Command and arguments to run from the app environment
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the locate command
#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// App name, or a package spec its name derives from
    pub app: String,

    /// Print the executable directory instead of the app directory
    #[arg(long)]
    pub bin: bool,
}

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
pub struct UninstallArgs {
    /// App name, or a package spec its name derives from
    pub app: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_version() {
        let cli = Cli::parse_from(["vapp", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn cli_parses_install() {
        let cli = Cli::parse_from(["vapp", "install", "black==24.1"]);
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.spec, "black==24.1");
                assert!(args.name.is_none());
                assert!(!args.update);
                assert!(!args.clean);
            }
            _ => panic!("expected Install command"),
        }
    }

    #[test]
    fn cli_parses_install_flags() {
        let cli = Cli::parse_from([
            "vapp",
            "install",
            "black",
            "--name",
            "fmt",
            "--update",
            "--clean",
            "--app-path-file",
            "/tmp/out",
        ]);
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.name.as_deref(), Some("fmt"));
                assert!(args.update);
                assert!(args.clean);
                assert_eq!(args.app_path_file, Some(PathBuf::from("/tmp/out")));
            }
            _ => panic!("expected Install command"),
        }
    }

    #[test]
    fn cli_parses_run_with_command() {
        let cli = Cli::parse_from(["vapp", "run", "black", "--", "black", "--check", "."]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.spec, "black");
                assert_eq!(args.command, vec!["black", "--check", "."]);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_run_without_command() {
        let cli = Cli::parse_from(["vapp", "run", "black"]);
        match cli.command {
            Commands::Run(args) => assert!(args.command.is_empty()),
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_run_separates_app_flags_from_vapp_flags() {
        let cli = Cli::parse_from(["vapp", "run", "--update", "black", "--", "black", "--update"]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.update);
                assert_eq!(args.command, vec!["black", "--update"]);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_list_format() {
        let cli = Cli::parse_from(["vapp", "list", "--format", "json"]);
        match cli.command {
            Commands::List(args) => assert!(matches!(args.format, OutputFormat::Json)),
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn cli_parses_locate() {
        let cli = Cli::parse_from(["vapp", "locate", "black", "--bin"]);
        match cli.command {
            Commands::Locate(args) => {
                assert_eq!(args.app, "black");
                assert!(args.bin);
            }
            _ => panic!("expected Locate command"),
        }
    }

    #[test]
    fn cli_parses_uninstall() {
        let cli = Cli::parse_from(["vapp", "uninstall", "black", "--yes"]);
        match cli.command {
            Commands::Uninstall(args) => {
                assert_eq!(args.app, "black");
                assert!(args.yes);
            }
            _ => panic!("expected Uninstall command"),
        }
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["vapp", "list"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["vapp", "-v", "list"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["vapp", "-vv", "list"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_global_cache_dir() {
        let cli = Cli::parse_from(["vapp", "list", "--cache-dir", "/tmp/apps"]);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/apps")));
    }
}
