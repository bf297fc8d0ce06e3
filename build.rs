//! Stamp the binary with a version label.
//!
//! Release builds (HEAD exactly on a tag) report the package version. Any
//! other build reports `<version>-dev+<short hash>`, or `<version>-dev` when
//! git is unavailable.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let on_tag = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    let label = match git(&["rev-parse", "--short", "HEAD"]) {
        _ if on_tag => version,
        Some(hash) if !hash.is_empty() => format!("{version}-dev+{hash}"),
        _ => format!("{version}-dev"),
    };

    println!("cargo:rustc-env=PHOTO_INGEST_VERSION={label}");
}
