// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::version::BuildIdentifier;

/// Macro defined when no other name is configured.
pub const DEFAULT_DEFINE: &str = "AUTO_GIT_HASH";

/// How the quotes around the token are written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quoting {
    /// `\"`, survives a pass through the shell.
    Escaped,
    /// Plain `"`, for argument vectors passed without a shell.
    Raw,
}

/// Formats the compiler define for an identifier, eg.
/// `-D AUTO_GIT_HASH=\"gabcdef0\"`.
pub fn define_flag(name: &str, id: &BuildIdentifier, quoting: Quoting) -> String {
    let quote = match quoting {
        Quoting::Escaped => "\\\"",
        Quoting::Raw => "\"",
    };
    format!("-D {}={}{}{}", name, quote, id.as_str(), quote)
}

/// Returns a new flag list with the flag appended, the snapshot is left
/// untouched.
pub fn append_flag(snapshot: &[String], flag: String) -> Vec<String> {
    let mut flags = Vec::with_capacity(snapshot.len() + 1);
    flags.extend_from_slice(snapshot);
    flags.push(flag);
    flags
}
