//! Test cases and the expectations checked against each client run.

use crate::error::Error;
use crate::executor::Outcome;
use crate::invocation::render_tokens;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single named client invocation and what it is expected to do.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    pub command: String,
    pub expect: Expectation,
}

impl TestCase {
    /// Build a case, sanitising `name` into a `test_` identifier.
    pub fn new(
        name: &str,
        description: impl Into<String>,
        command: impl Into<String>,
        expect: Expectation,
    ) -> Self {
        TestCase {
            name: test_name(name),
            description: description.into(),
            command: command.into(),
            expect,
        }
    }
}

/// Exit code assertion.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExitExpectation {
    ExitCode(i32),
    ExitCodeNot(i32),
}

impl ExitExpectation {
    fn holds(self, code: i32) -> bool {
        match self {
            ExitExpectation::ExitCode(want) => code == want,
            ExitExpectation::ExitCodeNot(avoid) => code != avoid,
        }
    }
}

impl fmt::Display for ExitExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitExpectation::ExitCode(code) => write!(f, "exit code == {code}"),
            ExitExpectation::ExitCodeNot(code) => write!(f, "exit code != {code}"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "RawExpectation")]
pub struct Expectation {
    #[serde(flatten)]
    pub exit: ExitExpectation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_contains: Option<String>,
}

/// The `expect` object of a suite file, before exactly one exit assertion is picked.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExpectation {
    #[serde(default)]
    exit_code: Option<i32>,
    #[serde(default)]
    exit_code_not: Option<i32>,
    #[serde(default)]
    stdout_contains: Option<String>,
    #[serde(default)]
    stderr_contains: Option<String>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ExpectationError {
    #[error("expectation needs one of \"exit_code\" or \"exit_code_not\"")]
    MissingExit,
    #[error("\"exit_code\" and \"exit_code_not\" are mutually exclusive")]
    ConflictingExit,
}

impl TryFrom<RawExpectation> for Expectation {
    type Error = ExpectationError;

    fn try_from(raw: RawExpectation) -> Result<Self, Self::Error> {
        let exit = match (raw.exit_code, raw.exit_code_not) {
            (Some(code), None) => ExitExpectation::ExitCode(code),
            (None, Some(code)) => ExitExpectation::ExitCodeNot(code),
            (None, None) => return Err(ExpectationError::MissingExit),
            (Some(_), Some(_)) => return Err(ExpectationError::ConflictingExit),
        };
        Ok(Expectation {
            exit,
            stdout_contains: raw.stdout_contains,
            stderr_contains: raw.stderr_contains,
        })
    }
}

/// Result of checking an [`Outcome`] against an [`Expectation`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "verdict", content = "reason", rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail(String),
    /// The case could not be run at all.
    Error(String),
}

impl Verdict {
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl Expectation {
    #[must_use]
    pub fn success() -> Self {
        Self::exit(ExitExpectation::ExitCode(0))
    }

    #[must_use]
    pub fn failure() -> Self {
        Self::exit(ExitExpectation::ExitCodeNot(0))
    }

    #[must_use]
    pub fn exit(exit: ExitExpectation) -> Self {
        Expectation {
            exit,
            stdout_contains: None,
            stderr_contains: None,
        }
    }

    #[must_use]
    pub fn with_stderr(mut self, needle: impl Into<String>) -> Self {
        self.stderr_contains = Some(needle.into());
        self
    }

    /// Check the exit code first, then stdout, then stderr. The first violated assertion is
    /// the reason reported.
    #[must_use]
    pub fn check(&self, outcome: &Outcome) -> Verdict {
        if !self.exit.holds(outcome.exit_code) {
            return Verdict::Fail(format!(
                "expected {}, got {}",
                self.exit, outcome.exit_code
            ));
        }
        if let Some(needle) = &self.stdout_contains {
            if !outcome.stdout.contains(needle.as_str()) {
                return Verdict::Fail(format!("stdout does not contain {needle:?}"));
            }
        }
        if let Some(needle) = &self.stderr_contains {
            if !outcome.stderr.contains(needle.as_str()) {
                return Verdict::Fail(format!("stderr does not contain {needle:?}"));
            }
        }
        Verdict::Pass
    }
}

/// A hand-written case as it appears in a suite file. Exactly one of `args` (tokens passed
/// to the configured binary) or `command` (a complete command line) is expected; `args`
/// wins when both are given.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub command: Option<String>,
    pub expect: Expectation,
}

impl CaseSpec {
    #[must_use]
    pub fn to_case(&self, binary: &str) -> TestCase {
        let command = match (&self.args, &self.command) {
            (Some(args), _) => {
                render_tokens(std::iter::once(binary).chain(args.iter().map(String::as_str)))
            }
            (None, Some(command)) => command.clone(),
            (None, None) => render_tokens([binary]),
        };
        let description = if self.description.is_empty() {
            self.name.clone()
        } else {
            self.description.clone()
        };
        TestCase::new(&self.name, description, command, self.expect.clone())
    }
}

/// Lower-case `raw`, map every run of non-alphanumerics to a single `_`, and prefix `test_`
/// unless it is already there. A name with no alphanumerics at all becomes `test_unnamed`.
#[must_use]
pub fn test_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len() + 5);
    let mut pending_sep = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !name.is_empty() {
                name.push('_');
            }
            pending_sep = false;
            name.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if name.is_empty() {
        "test_unnamed".to_string()
    } else if name.starts_with("test_") {
        name
    } else {
        format!("test_{name}")
    }
}

/// Fail on the first name that appears twice.
pub fn ensure_unique(cases: &[TestCase]) -> Result<(), Error> {
    let mut seen = HashSet::with_capacity(cases.len());
    for case in cases {
        if !seen.insert(case.name.as_str()) {
            return Err(Error::DuplicateCase(case.name.clone()));
        }
    }
    Ok(())
}
