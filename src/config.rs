use crate::case::CaseSpec;
use crate::error::Error;
use crate::invocation::{Family, QueryMode};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

/// Exit code substituted for a case whose client process had to be killed.
pub const TIMEOUT_EXIT_CODE: i32 = 69;

/// Wall-clock limit for a single client invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Invocation name of the client under test, e.g. `./dns`.
    pub binary: String,
    /// Shell used to run each command line, called as `<shell> -c <command>`.
    pub shell: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    pub timeout_exit_code: i32,
    pub matrix: Matrix,
    /// Whether to include the built-in battery of malformed invocations.
    pub builtin_invalid: bool,
    /// Hand-written cases, appended after the generated ones.
    pub cases: Vec<CaseSpec>,
}

/// Axes of the generated valid-query battery.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Matrix {
    pub servers: Vec<String>,
    /// Names used for forward lookups.
    pub hosts: Vec<String>,
    /// IPv4/IPv6 literals used for reverse lookups.
    pub addresses: Vec<String>,
    pub modes: Vec<QueryMode>,
    pub families: Vec<Family>,
    pub port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            binary: "./dns".to_string(),
            shell: "/bin/sh".to_string(),
            timeout: DEFAULT_TIMEOUT,
            timeout_exit_code: TIMEOUT_EXIT_CODE,
            matrix: Matrix::default(),
            builtin_invalid: true,
            cases: Vec::default(),
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix {
            servers: vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()],
            hosts: vec!["www.fit.vut.cz".to_string(), "www.google.com".to_string()],
            addresses: vec![
                "147.229.9.26".to_string(),
                "2001:4860:4860::8888".to_string(),
            ],
            modes: vec![QueryMode::Iterative, QueryMode::Recursive],
            families: vec![Family::V4, Family::V6],
            port: None,
        }
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }
        if self.binary.trim().is_empty() {
            return Err(Error::EmptyBinary);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::ExitExpectation;

    #[test]
    fn empty_object_uses_defaults() {
        let conf: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(conf.binary, "./dns");
        assert_eq!(conf.timeout, Duration::from_secs(2));
        assert_eq!(conf.timeout_exit_code, 69);
        assert!(conf.builtin_invalid);
        assert_eq!(conf.matrix.modes.len(), 2);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn parses_full_suite() {
        let conf: Config = serde_json::from_str(
            r#"{
                "binary": "/opt/dns",
                "timeout": 5,
                "matrix": {
                    "servers": ["1.1.1.1"],
                    "hosts": ["example.com"],
                    "addresses": [],
                    "modes": ["recursive"],
                    "families": ["v6"],
                    "port": 5353
                },
                "builtin_invalid": false,
                "cases": [
                    {
                        "name": "bad port",
                        "args": ["-s", "1.1.1.1", "-p", "x", "example.com"],
                        "expect": { "exit_code_not": 0, "stderr_contains": "Usage" }
                    }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(conf.binary, "/opt/dns");
        assert_eq!(conf.timeout, Duration::from_secs(5));
        assert_eq!(conf.matrix.port, Some(5353));
        assert_eq!(conf.matrix.modes, vec![QueryMode::Recursive]);
        assert_eq!(conf.matrix.families, vec![Family::V6]);
        assert_eq!(conf.cases.len(), 1);
        assert_eq!(conf.cases[0].expect.exit, ExitExpectation::ExitCodeNot(0));
        assert_eq!(conf.cases[0].expect.stderr_contains.as_deref(), Some("Usage"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let conf: Config = serde_json::from_str(r#"{"timeout": 0}"#).unwrap();
        assert!(matches!(conf.validate(), Err(Error::InvalidTimeout)));
    }

    #[test]
    fn rejects_empty_binary() {
        let conf: Config = serde_json::from_str(r#"{"binary": "  "}"#).unwrap();
        assert!(matches!(conf.validate(), Err(Error::EmptyBinary)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let res: Result<Config, _> = serde_json::from_str(r#"{"binray": "./dns"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_misspelled_expect_keys() {
        let res: Result<Config, _> = serde_json::from_str(
            r#"{"cases": [{"name": "q", "args": [], "expect": {"exit_code": 0, "stdout_contans": "x"}}]}"#,
        );
        assert!(res.unwrap_err().to_string().contains("stdout_contans"));
    }
}
