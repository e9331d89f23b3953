//! Shared E2E test helpers for `ward` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Environment variables that would leak host config into a test run.
const WARD_ENV_VARS: &[&str] = &[
    "WARD_DEBUG",
    "WARD_DATA_PATH",
    "WARD_CONSULTATION_FEE",
    "RUST_LOG",
];

/// An isolated ward: its own HOME, project root and snapshot file.
pub struct Ward {
    dir: tempfile::TempDir,
}

impl Ward {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir for ward"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join("data").join("ward.json")
    }

    /// Writes `<root>/.ward/config.toml`.
    pub fn write_project_config(&self, toml: &str) {
        let dir = self.dir.path().join(".ward");
        std::fs::create_dir_all(&dir).expect("create .ward");
        std::fs::write(dir.join("config.toml"), toml).expect("write config");
    }

    /// A `ward` command bound to this ward's snapshot and project root.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("ward");
        cmd.timeout(TIMEOUT_BASIC);
        for var in WARD_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.root());
        cmd.arg("-C").arg(self.root());
        cmd.arg("--data").arg(self.data_path());
        cmd
    }

    /// Runs `args` and returns stdout parsed as JSON. Panics on failure.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().arg("--json").args(args).output().expect("run ward");
        assert!(
            output.status.success(),
            "ward {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is JSON")
    }
}
