//! Integration tests for vapp

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn vapp() -> Command {
        cargo_bin_cmd!("vapp")
    }

    /// A vapp command isolated to a per-test config and cache root
    fn vapp_in(temp: &TempDir) -> Command {
        let mut cmd = vapp();
        cmd.arg("--config")
            .arg(temp.path().join("config.toml"))
            .arg("--cache-dir")
            .arg(temp.path().join("apps"));
        cmd
    }

    /// Seed a ready app entry by hand: a venv bin dir with one script
    /// plus the completed-build marker pointing at it.
    fn seed_ready_app(temp: &TempDir, name: &str, script: &str) {
        let entry = temp.path().join("apps").join(name);
        let exec_root = entry.join("venv/bin");
        fs::create_dir_all(&exec_root).unwrap();

        let tool = exec_root.join("tool");
        fs::write(&tool, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let marker = format!(
            r#"{{"spec":"{name}==1.0","exec_root":"{}","built_at":"2026-08-20T10:00:00Z"}}"#,
            exec_root.display()
        );
        fs::write(entry.join("ready.json"), marker).unwrap();
    }

    #[test]
    fn help_displays() {
        vapp()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("virtual Python application"));
    }

    #[test]
    fn version_flag_displays() {
        vapp()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("vapp"));
    }

    #[test]
    fn version_subcommand_prints_bare_version() {
        vapp()
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn list_empty_table() {
        let temp = TempDir::new().unwrap();
        vapp_in(&temp)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No apps installed"));
    }

    #[test]
    fn list_empty_json() {
        let temp = TempDir::new().unwrap();
        vapp_in(&temp)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn list_shows_seeded_app() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("black\n"));

        vapp_in(&temp)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("black").and(predicate::str::contains("ready")));
    }

    #[test]
    fn list_json_reports_state_and_spec() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"state\": \"ready\"")
                    .and(predicate::str::contains("black==1.0")),
            );
    }

    #[test]
    fn install_rejects_empty_spec() {
        let temp = TempDir::new().unwrap();
        vapp_in(&temp)
            .args(["install", ""])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid package spec"));
    }

    #[test]
    fn install_reports_missing_interpreter() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("config.toml"),
            "[toolchain]\npython = \"vapp-no-such-interpreter\"\n",
        )
        .unwrap();

        vapp_in(&temp)
            .args(["install", "black"])
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("toolchain")
                    .and(predicate::str::contains("vapp-no-such-interpreter")),
            );
    }

    #[test]
    fn locate_missing_app_fails() {
        let temp = TempDir::new().unwrap();
        vapp_in(&temp)
            .args(["locate", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not installed"));
    }

    #[test]
    fn locate_prints_entry_and_bin_paths() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\nexit 0\n");
        let entry = temp.path().join("apps/black");

        vapp_in(&temp)
            .args(["locate", "black"])
            .assert()
            .success()
            .stdout(predicate::str::contains(entry.display().to_string()));

        vapp_in(&temp)
            .args(["locate", "black", "--bin"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                entry.join("venv/bin").display().to_string(),
            ));
    }

    #[test]
    fn locate_accepts_a_spec_for_the_same_app() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp)
            .args(["locate", "black==24.1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("black"));
    }

    #[test]
    fn locate_finds_an_app_installed_under_an_explicit_name() {
        let temp = TempDir::new().unwrap();
        // Laid out as `install --name My_Tool` leaves it; derivation would
        // have picked "my-tool" instead.
        seed_ready_app(&temp, "My_Tool", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp)
            .args(["locate", "My_Tool"])
            .assert()
            .success()
            .stdout(predicate::str::contains("My_Tool"));
    }

    #[test]
    fn uninstall_missing_app_fails() {
        let temp = TempDir::new().unwrap();
        vapp_in(&temp)
            .args(["uninstall", "ghost", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not installed"));
    }

    #[test]
    fn uninstall_removes_seeded_app() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp)
            .args(["uninstall", "black", "--yes"])
            .assert()
            .success();

        assert!(!temp.path().join("apps/black").exists());

        vapp_in(&temp)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn uninstall_removes_an_app_installed_under_an_explicit_name() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "My_Tool", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp)
            .args(["uninstall", "My_Tool", "--yes"])
            .assert()
            .success();

        assert!(!temp.path().join("apps/My_Tool").exists());
    }

    #[cfg(unix)]
    #[test]
    fn run_relays_app_output_and_exit_code() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\necho hi from tool\nexit 7\n");

        vapp_in(&temp)
            .args(["run", "black", "--", "tool"])
            .assert()
            .code(7)
            .stdout(predicate::str::contains("hi from tool"));
    }

    #[cfg(unix)]
    #[test]
    fn run_passes_arguments_through() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\necho \"$@\"\n");

        vapp_in(&temp)
            .args(["run", "black", "--", "tool", "--check", "src"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--check src"));
    }

    #[test]
    fn run_missing_command_fails() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp)
            .args(["run", "black", "--", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Command not found"));
    }

    #[test]
    fn run_without_command_succeeds_when_ready() {
        let temp = TempDir::new().unwrap();
        seed_ready_app(&temp, "black", "#!/bin/sh\nexit 0\n");

        vapp_in(&temp).args(["run", "black"]).assert().success();
    }
}
