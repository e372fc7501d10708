//! Stamps `--version` with the build time and the commit it was built from.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    println!("cargo:rustc-env=WEBSTACK_BUILD_TIMESTAMP={}", built_at);

    let commit = short_head().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=WEBSTACK_GIT_COMMIT={}", commit);
}

/// Abbreviated hash of `HEAD`, or `None` outside a git checkout.
fn short_head() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}
