use std::path::{Path, PathBuf};
use std::process::Output;

use serde_json::Value;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::MockServer;

/// An isolated CLI environment: its own credentials file and API server.
pub struct Harness {
    pub dir: TempDir,
    pub api_url: String,
}

impl Harness {
    pub fn new(server: &MockServer) -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            api_url: format!("{}/api", server.uri()),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("credentials.json")
    }

    /// Seed the credentials file as a previous `login` would have.
    pub fn seed(&self, access: &str, refresh: &str) {
        let json = serde_json::json!({"access_token": access, "refresh_token": refresh});
        std::fs::write(self.store_path(), json.to_string()).expect("Failed to seed store");
    }

    pub fn stored(&self) -> Option<Value> {
        read_json(&self.store_path())
    }

    /// Run the CLI binary with arguments.
    pub async fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_jwtpipe"))
            .args(args)
            .env("JWTPIPE_API_URL", &self.api_url)
            .env("JWTPIPE_STORE", self.store_path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .await
            .expect("Failed to execute CLI")
    }

    /// Run the CLI and expect success.
    pub async fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure.
    pub async fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

fn read_json(path: &Path) -> Option<Value> {
    let bytes = std::fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}
