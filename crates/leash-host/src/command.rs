// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fully resolved command lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered list of command-line tokens, program first.
///
/// Produced by [`LaunchBuilder::command`](crate::LaunchBuilder::command);
/// nothing in it is substituted further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandLine(Vec<String>);

impl CommandLine {
    /// Wrap a token list.
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    /// The executable, or `""` for an empty command line.
    pub fn program(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    /// Everything after the executable.
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    /// All tokens, executable included.
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the token list.
    pub fn into_tokens(self) -> Vec<String> {
        self.0
    }

    /// A tokio [`Command`](tokio::process::Command) for this command line,
    /// with no stdio configuration applied.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(self.program());
        cmd.args(self.args());
        cmd
    }
}

impl AsRef<[String]> for CommandLine {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if needs_quoting(token) {
                write!(f, "'{}'", token.replace('\'', r"'\''"))?;
            } else {
                f.write_str(token)?;
            }
        }
        Ok(())
    }
}

fn needs_quoting(token: &str) -> bool {
    token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\' | '$' | '`'))
}
