#![cfg(unix)]

use dns_conformance::case::CaseSpec;
use dns_conformance::config::Matrix;
use dns_conformance::invocation::{Family, QueryMode};
use dns_conformance::{generate, Config, Runner, ShellExecutor, Verdict};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A client stand-in that validates its arguments like the real one and never touches the
/// network.
const STRICT_CLIENT: &str = r#"#!/bin/sh
r=0; x=0; six=0; s=""; p=""
while getopts "rx6s:p:" opt; do
  case $opt in
    r) [ $r = 1 ] && exit 1; r=1 ;;
    x) [ $x = 1 ] && exit 1; x=1 ;;
    6) [ $six = 1 ] && exit 1; six=1 ;;
    s) [ -n "$s" ] && exit 1; s=$OPTARG ;;
    p) [ -n "$p" ] && exit 1
       case $OPTARG in ''|*[!0-9]*) exit 1 ;; esac
       p=$OPTARG ;;
    *) echo "Usage: dns [-r] [-x] [-6] -s server [-p port] address" >&2; exit 1 ;;
  esac
done
shift $((OPTIND - 1))
[ -z "$s" ] && { echo "Usage: dns [-r] [-x] [-6] -s server [-p port] address" >&2; exit 1; }
[ $# -eq 1 ] || exit 1
case $s in *[!0-9.:]*) exit 1 ;; esac
if [ $x = 1 ]; then
  case $1 in *[!0-9a-fA-F.:]*) exit 1 ;; esac
fi
echo "Authoritative: No, Recursive: Yes, Truncated: No"
echo "Question section (1)"
exit 0
"#;

const HANGING_CLIENT: &str = "#!/bin/sh\nsleep 30\n";

fn install(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn local_matrix() -> Matrix {
    Matrix {
        servers: vec!["127.0.0.1".to_string()],
        hosts: vec!["www.fit.vut.cz".to_string(), "www.google.com".to_string()],
        addresses: vec!["147.229.9.26".to_string(), "::1".to_string()],
        modes: vec![QueryMode::Iterative, QueryMode::Recursive],
        families: vec![Family::V4, Family::V6],
        port: Some(5353),
    }
}

fn runner(config: Config) -> Runner {
    let config = Arc::new(config);
    let executor = Arc::new(ShellExecutor::from_config(&config));
    Runner::new(config, executor)
}

#[tokio::test]
async fn strict_client_passes_the_whole_suite() {
    let dir = TempDir::new().unwrap();
    let client = install(dir.path(), "dns", STRICT_CLIENT);
    let config = Config {
        binary: client.to_str().unwrap().to_string(),
        matrix: local_matrix(),
        ..Config::default()
    };
    let cases = generate(&config).unwrap();
    let report = runner(config).run(&cases).await;

    let failures: Vec<_> = report
        .results
        .iter()
        .filter(|r| !r.verdict.is_pass())
        .map(|r| (&r.case.command, &r.verdict))
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
    // 2 modes x (2 families x 2 hosts + 2 addresses) + the invalid battery
    assert!(report.results.len() > 12);
    assert!(report.results.iter().all(|r| r.outcome.is_some()));
}

#[tokio::test]
async fn permissive_client_fails_the_invalid_battery() {
    let dir = TempDir::new().unwrap();
    let client = install(dir.path(), "dns", "#!/bin/sh\nexit 0\n");
    let config = Config {
        binary: client.to_str().unwrap().to_string(),
        matrix: local_matrix(),
        ..Config::default()
    };
    let cases = generate(&config).unwrap();
    let report = runner(config).with_filter(Some("missing".to_string())).run(&cases).await;

    let names: Vec<&str> = report.results.iter().map(|r| r.case.name.as_str()).collect();
    assert_eq!(names, vec!["test_missing_server", "test_missing_address"]);
    assert_eq!(report.failed(), 2);
    assert_eq!(
        report.results[0].verdict,
        Verdict::Fail("expected exit code != 0, got 0".to_string())
    );
}

#[tokio::test]
async fn hanging_client_is_reported_with_sentinel() {
    let dir = TempDir::new().unwrap();
    let client = install(dir.path(), "dns", HANGING_CLIENT);
    let config = Config {
        binary: client.to_str().unwrap().to_string(),
        timeout: Duration::from_secs(1),
        matrix: Matrix {
            servers: vec!["127.0.0.1".to_string()],
            hosts: vec!["www.fit.vut.cz".to_string()],
            addresses: vec![],
            modes: vec![QueryMode::Recursive],
            families: vec![Family::V4],
            port: None,
        },
        builtin_invalid: false,
        ..Config::default()
    };
    let cases = generate(&config).unwrap();
    assert_eq!(cases.len(), 1);
    let report = runner(config).run(&cases).await;

    let outcome = report.results[0].outcome.as_ref().unwrap();
    assert!(outcome.timed_out);
    assert_eq!(outcome.exit_code, 69);
    assert_eq!(outcome.stderr, "Command timed out");
    assert!(outcome.elapsed < Duration::from_secs(10));
    assert!(!report.is_success());
}

#[tokio::test]
async fn hand_written_cases_check_output() {
    let dir = TempDir::new().unwrap();
    let client = install(dir.path(), "dns", STRICT_CLIENT);
    let specs: Vec<CaseSpec> = serde_json::from_str(
        r#"[
            {"name": "usage on missing server", "args": ["www.fit.vut.cz"],
             "expect": {"exit_code_not": 0, "stderr_contains": "Usage:"}},
            {"name": "question printed", "args": ["-s", "127.0.0.1", "example.com"],
             "expect": {"exit_code": 0, "stdout_contains": "Question section"}},
            {"name": "wrong expectation", "args": ["-s", "127.0.0.1", "example.com"],
             "expect": {"exit_code": 0, "stdout_contains": "Answer section"}}
        ]"#,
    )
    .unwrap();
    let config = Config {
        binary: client.to_str().unwrap().to_string(),
        matrix: Matrix {
            servers: vec![],
            ..Matrix::default()
        },
        builtin_invalid: false,
        cases: specs,
        ..Config::default()
    };
    let cases = generate(&config).unwrap();
    let report = runner(config).run(&cases).await;

    assert_eq!(report.results.len(), 3);
    assert!(report.results[0].verdict.is_pass());
    assert!(report.results[1].verdict.is_pass());
    assert_eq!(
        report.results[2].verdict,
        Verdict::Fail("stdout does not contain \"Answer section\"".to_string())
    );
}

#[test]
fn cli_lists_cases_without_running_them() {
    let output = Command::new(env!("CARGO_BIN_EXE_dns-conformance"))
        .args(["--binary", "/nonexistent/dns", "--list", "--filter", "invalid"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("test_invalid_server\t/nonexistent/dns -r -s invalid.server www.fit.vut.cz"));
    assert!(stdout.contains("test_invalid_option\t/nonexistent/dns -z -s kazi.fit.vutbr.cz www.fit.vut.cz"));
}

#[test]
fn cli_exit_status_reflects_results() {
    let dir = TempDir::new().unwrap();
    let suite = dir.path().join("suite.json");
    fs::write(
        &suite,
        r#"{
            "binary": "true",
            "matrix": {"servers": []},
            "builtin_invalid": false,
            "cases": [{"name": "always ok", "expect": {"exit_code": 0}}]
        }"#,
    )
    .unwrap();
    let ok = Command::new(env!("CARGO_BIN_EXE_dns-conformance"))
        .arg("--config")
        .arg(&suite)
        .output()
        .unwrap();
    assert_eq!(ok.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&ok.stdout).contains("test_always_ok (always ok) ... ok"));

    let failing = Command::new(env!("CARGO_BIN_EXE_dns-conformance"))
        .arg("--config")
        .arg(&suite)
        .args(["--binary", "false"])
        .output()
        .unwrap();
    assert_eq!(failing.status.code(), Some(1));

    let bad_config = Command::new(env!("CARGO_BIN_EXE_dns-conformance"))
        .args(["--config", "/nonexistent/suite.json"])
        .output()
        .unwrap();
    assert_eq!(bad_config.status.code(), Some(2));
}
