// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::io;
use std::process::Command;

/// Describes the tool's own checkout, falling back to a bare hash when there
/// are no tags.
fn build_git_version() -> Result<Option<String>, io::Error> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always"])
        .output()?;
    if !output.status.success() {
        return Ok(None);
    }

    let vers = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if vers.is_empty() { None } else { Some(vers) })
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    let vers = match build_git_version() {
        Ok(Some(vers)) => vers,
        _ => env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("cargo:rustc-env=BUILD_GIT_VERSION={}", vers);
}
