// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::git::DescribeError;

/// Token used when repository history cannot be queried.
pub const FALLBACK_TOKEN: &str = "g0000000";

/// Marks the abbreviated hash in `git describe` output.
const HASH_MARKER: &str = "-g";

/// Result of describing the repository.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Raw descriptor as returned by git.
    Described(String),
    /// Describe failed, the fallback token is used instead.
    Fallback(DescribeError),
}

/// Build identifier derived from an outcome.
#[derive(Debug, PartialEq, Clone)]
pub struct BuildIdentifier(String);

impl BuildIdentifier {
    /// Derives the identifier, using `fallback` when describe did not succeed.
    pub fn from_outcome(outcome: &Outcome, fallback: &str) -> Self {
        let descriptor = match outcome {
            Outcome::Described(descriptor) => descriptor.as_str(),
            Outcome::Fallback(_) => fallback,
        };

        log::info!("firmware revision returned from git: {}", descriptor);

        let token = hash_suffix(descriptor);
        if token.len() != descriptor.len() {
            log::info!("filtered git hash: {}", token);
        }

        BuildIdentifier(token.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strips the tag and commit count from a descriptor such as
/// `v1.2.3-5-gabcdef0`, keeping `gabcdef0`. Descriptors without the `-g`
/// marker, such as the bare hash of an untagged repository, are returned as
/// is.
pub fn hash_suffix(descriptor: &str) -> &str {
    match descriptor.find(HASH_MARKER) {
        Some(idx) => {
            log::info!("contains build info at index {}", idx);
            &descriptor[idx + 1..]
        }
        None => descriptor,
    }
}
