//! Common test utilities for webstack integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never read the
//! user's `~/.config/webstack/facts.kdl`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Facts every scenario runs with.
pub const RSPEC_FACTS: &str = r#"
fqdn "rspec.example42.com"
ipaddress "10.42.42.42"
operatingsystem "Ubuntu"
"#;

/// A test environment with an isolated config directory.
///
/// The `webstack()` method returns a `Command` that sets `WEBSTACK_CONFIG_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub config_dir: TempDir,
    pub work_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            work_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment whose system facts are the rspec node.
    pub fn rspec() -> Self {
        let env = Self::new();
        env.write_system_facts(RSPEC_FACTS);
        env
    }

    /// Get a Command for the webstack binary with isolated config directory.
    pub fn webstack(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_webstack"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("WEBSTACK_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("WEBSTACK_NODE");
        cmd.env_remove("WEBSTACK_LOG");
        cmd
    }

    /// Write the system facts file.
    pub fn write_system_facts(&self, content: &str) {
        std::fs::write(self.config_dir.path().join("facts.kdl"), content)
            .expect("Failed to write system facts");
    }

    /// Write a file into the work directory and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn work_path(&self) -> &Path {
        self.work_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is not valid JSON")
}
