//! Client command lines.
//!
//! The client under test is driven only through its command line:
//!
//! ```text
//! dns [-r] [-x] [-6] -s server [-p port] address
//! ```
//!
//! [`Invocation`] models one such call and renders it as the shell command string that the
//! [executor][crate::executor] hands to `sh -c`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the client is asked to set the Recursion Desired bit (`-r`).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Iterative,
    Recursive,
}

impl QueryMode {
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            QueryMode::Iterative => "iterative",
            QueryMode::Recursive => "recursive",
        }
    }
}

/// Address family of a forward query: `A` by default, `AAAA` with `-6`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    V4,
    V6,
}

impl Family {
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Family::V4 => "ipv4",
            Family::V6 => "ipv6",
        }
    }
}

/// A single call of the client binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub binary: String,
    pub recursive: bool,
    pub reverse: bool,
    pub ipv6: bool,
    pub server: Option<String>,
    pub port: Option<u16>,
    /// Tokens placed between the options and the address, e.g. unknown flags.
    pub extra: Vec<String>,
    pub address: Option<String>,
}

impl Invocation {
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Invocation {
            binary: binary.into(),
            ..Invocation::default()
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: QueryMode) -> Self {
        self.recursive = mode == QueryMode::Recursive;
        self
    }

    #[must_use]
    pub fn family(mut self, family: Family) -> Self {
        self.ipv6 = family == Family::V6;
        self
    }

    #[must_use]
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    #[must_use]
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn extra(mut self, token: impl Into<String>) -> Self {
        self.extra.push(token.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Tokens in canonical order, binary first.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![self.binary.clone()];
        if self.recursive {
            tokens.push("-r".to_string());
        }
        if self.reverse {
            tokens.push("-x".to_string());
        }
        if self.ipv6 {
            tokens.push("-6".to_string());
        }
        if let Some(server) = &self.server {
            tokens.push("-s".to_string());
            tokens.push(server.clone());
        }
        if let Some(port) = self.port {
            tokens.push("-p".to_string());
            tokens.push(port.to_string());
        }
        tokens.extend(self.extra.iter().cloned());
        if let Some(address) = &self.address {
            tokens.push(address.clone());
        }
        tokens
    }

    /// The shell command string for this invocation.
    #[must_use]
    pub fn render(&self) -> String {
        render_tokens(self.tokens())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Join tokens into a `sh -c` command string, quoting only where the shell would otherwise
/// split or interpret a token.
pub fn render_tokens<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| quote(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
