//! Integration tests for the CLI binary
//!
//! These tests run the built binary against local experiment directories.
//! None of them reach a remote host: every run either fails while loading
//! or has no scenarios to execute.

#![allow(clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

const BIN: &str = env!("CARGO_BIN_EXE_disruption-generator");

/// Run the binary from an isolated working directory
fn run(workdir: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .current_dir(workdir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn workdir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn experiments(root: &Path) -> String {
    let dir = root.join("experiments");
    fs::create_dir(&dir).expect("mkdir");
    dir.to_string_lossy().into_owned()
}

// ============================================================================
// Argument Tests
// ============================================================================

mod argument_tests {
    use super::*;

    #[test]
    fn version_flag() {
        let dir = workdir();
        let output = run(dir.path(), &["--version"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("disruption-generator"));
    }

    #[test]
    fn help_lists_options() {
        let dir = workdir();
        let output = run(dir.path(), &["--help"]);
        assert!(output.status.success());
        let help = stdout(&output);
        assert!(help.contains("--experiments-path"));
        assert!(help.contains("--ssh-host-key"));
        assert!(help.contains("--parallel"));
    }

    #[test]
    fn missing_key_file_fails_before_banner() {
        let dir = workdir();
        let path = experiments(dir.path());
        let output = run(dir.path(), &["-e", &path, "-k", "no_such_key"]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("no_such_key"));
        assert!(!stdout(&output).contains("DISRUPTION AS A SERVICE"));
    }

    #[test]
    fn unknown_flag_fails() {
        let dir = workdir();
        let output = run(dir.path(), &["--bogus"]);
        assert!(!output.status.success());
    }
}

// ============================================================================
// Run Tests
// ============================================================================

mod run_tests {
    use super::*;

    #[test]
    fn empty_experiments_exit_cleanly_after_banner() {
        let dir = workdir();
        let path = experiments(dir.path());

        let output = run(dir.path(), &["-e", &path]);

        assert_eq!(output.status.code(), Some(0));
        let out = stdout(&output);
        assert!(out.starts_with("!!! DISRUPTION AS A SERVICE !!!\n"));
        assert!(out.contains("!!!    USE WITH CAUTION     !!!"));
    }

    #[test]
    fn default_experiments_directory_is_used() {
        let dir = workdir();
        experiments(dir.path());

        let output = run(dir.path(), &[]);

        assert_eq!(output.status.code(), Some(0));
    }

    #[test]
    fn missing_experiments_directory_fails() {
        let dir = workdir();
        let output = run(dir.path(), &["-e", "does-not-exist"]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("does-not-exist"));
    }

    #[test]
    fn unknown_action_fails_before_any_connection() {
        let dir = workdir();
        let path = experiments(dir.path());
        fs::write(
            Path::new(&path).join("bad.yaml"),
            r#"- disrupt_action:
    - name: bad
      listener:
        regex: "ERROR"
        log: /var/log/app.log
        host: 127.0.0.1
      trigger:
        - action:
            name: fork_bomb
            params: x
            target_host: 127.0.0.1
            wait: 0
            timeout: 1
"#,
        )
        .expect("write");

        let output = run(dir.path(), &["-e", &path]);

        assert_eq!(output.status.code(), Some(1));
        let err = stderr(&output);
        assert!(err.contains("fork_bomb"));
        assert!(err.contains("restart_service"));
        assert!(!stdout(&output).contains("Scenario:"));
    }

    #[test]
    fn missing_config_file_fails() {
        let dir = workdir();
        let path = experiments(dir.path());

        let output = run(dir.path(), &["-e", &path, "-c", "absent.toml"]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Failed to load configuration"));
    }

    #[test]
    fn config_file_supplies_experiments_path() {
        let dir = workdir();
        let custom = dir.path().join("custom");
        fs::create_dir(&custom).expect("mkdir");
        let path = custom.to_string_lossy().into_owned();
        fs::write(
            dir.path().join("disruption.toml"),
            format!("[run]\nexperiments_path = {path:?}\nparallel_scenarios = true\n"),
        )
        .expect("write");

        let output = run(dir.path(), &[]);

        assert_eq!(output.status.code(), Some(0));
    }
}
