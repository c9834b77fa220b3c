//! Test case generation.
//!
//! Two batteries are produced from a [`Config`]:
//!
//! * the **query matrix**: every server × host × [`QueryMode`] × [`Family`] forward lookup,
//!   and every server × address × [`QueryMode`] reverse (`-x`) lookup, all expected to exit 0.
//! * the **invalid-argument battery**: malformed command lines (missing or duplicated options,
//!   surplus arguments, bad values) all expected to exit nonzero.
//!
//! Hand-written [`CaseSpec`][crate::case::CaseSpec]s from the suite file follow, in file order.

use crate::case::{ensure_unique, Expectation, TestCase};
use crate::config::{Config, Matrix};
use crate::error::Error;
use crate::invocation::{render_tokens, Family, Invocation, QueryMode};
use std::net::IpAddr;
use std::str::FromStr;
use trust_dns_proto::rr::Name;

// Fixed operands of the invalid-argument battery.
const KNOWN_SERVER: &str = "kazi.fit.vutbr.cz";
const KNOWN_HOST: &str = "www.fit.vut.cz";
const OTHER_HOST: &str = "www.google.com";
const KNOWN_ADDRESS: &str = "147.229.9.26";
const INVALID_SERVER: &str = "invalid.server";

/// Build the full, ordered list of cases for a suite.
///
/// # Errors
///
/// Returns [`Error::InvalidMatrixEntry`] if a matrix server, host or address is malformed, and
/// [`Error::DuplicateCase`] if two cases share a test name.
pub fn generate(config: &Config) -> Result<Vec<TestCase>, Error> {
    let mut cases = query_matrix(&config.binary, &config.matrix)?;
    if config.builtin_invalid {
        cases.extend(invalid_argument_cases(&config.binary));
    }
    cases.extend(config.cases.iter().map(|spec| spec.to_case(&config.binary)));
    ensure_unique(&cases)?;
    tracing::debug!("generated {} test cases", cases.len());
    Ok(cases)
}

/// Forward and reverse lookups for every combination in the matrix.
///
/// # Errors
///
/// Returns [`Error::InvalidMatrixEntry`] for the first malformed server, host or address.
pub fn query_matrix(binary: &str, matrix: &Matrix) -> Result<Vec<TestCase>, Error> {
    for server in &matrix.servers {
        validate_server(server)?;
    }
    let hosts = matrix
        .hosts
        .iter()
        .map(|h| parse_host(h).map(|_| h.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let addresses = matrix
        .addresses
        .iter()
        .map(|a| parse_address(a).map(|ip| (a.as_str(), ip)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut cases = Vec::new();
    for server in &matrix.servers {
        for mode in &matrix.modes {
            for family in &matrix.families {
                for host in &hosts {
                    cases.push(forward_case(binary, server, host, *mode, *family, matrix.port));
                }
            }
            for (address, ip) in &addresses {
                cases.push(reverse_case(binary, server, address, *ip, *mode, matrix.port));
            }
        }
    }
    Ok(cases)
}

fn forward_case(
    binary: &str,
    server: &str,
    host: &str,
    mode: QueryMode,
    family: Family,
    port: Option<u16>,
) -> TestCase {
    let invocation = Invocation::new(binary)
        .mode(mode)
        .family(family)
        .server(server)
        .port(port)
        .address(host);
    let record = match family {
        Family::V4 => "A",
        Family::V6 => "AAAA",
    };
    TestCase::new(
        &format!("{} {} {server} {host}", mode.slug(), family.slug()),
        format!("{} {record} lookup of {host} via {server}", mode.slug()),
        invocation.render(),
        Expectation::success(),
    )
}

fn reverse_case(
    binary: &str,
    server: &str,
    address: &str,
    ip: IpAddr,
    mode: QueryMode,
    port: Option<u16>,
) -> TestCase {
    let family = match ip {
        IpAddr::V4(_) => Family::V4,
        IpAddr::V6(_) => Family::V6,
    };
    let invocation = Invocation::new(binary)
        .mode(mode)
        .reverse()
        .family(family)
        .server(server)
        .port(port)
        .address(address);
    TestCase::new(
        &format!("{} reverse {server} {address}", mode.slug()),
        format!(
            "{} PTR lookup of {} via {server}",
            mode.slug(),
            Name::from(ip)
        ),
        invocation.render(),
        Expectation::success(),
    )
}

/// Malformed command lines that a conforming client must reject with a nonzero exit code.
#[must_use]
pub fn invalid_argument_cases(binary: &str) -> Vec<TestCase> {
    let base = || Invocation::new(binary);
    let cases = [
        (
            "missing server",
            "no -s option",
            base().mode(QueryMode::Recursive).address(KNOWN_HOST),
        ),
        (
            "invalid server",
            "server that is not an address",
            base()
                .mode(QueryMode::Recursive)
                .server(INVALID_SERVER)
                .address(KNOWN_HOST),
        ),
        (
            "missing address",
            "no trailing address",
            base().mode(QueryMode::Recursive).server(KNOWN_SERVER),
        ),
        ("no arguments", "binary alone", base()),
        (
            "duplicate recursive",
            "-r given twice",
            base()
                .mode(QueryMode::Recursive)
                .server(KNOWN_SERVER)
                .extra("-r")
                .address(KNOWN_HOST),
        ),
        (
            "duplicate reverse",
            "-x given twice",
            base()
                .reverse()
                .server(KNOWN_SERVER)
                .extra("-x")
                .address(KNOWN_ADDRESS),
        ),
        (
            "duplicate ipv6",
            "-6 given twice",
            base()
                .family(Family::V6)
                .server(KNOWN_SERVER)
                .extra("-6")
                .address(KNOWN_HOST),
        ),
        (
            "duplicate server",
            "-s given twice",
            base()
                .server(KNOWN_SERVER)
                .extra("-s")
                .extra("8.8.8.8")
                .address(KNOWN_HOST),
        ),
        (
            "duplicate port",
            "-p given twice",
            base()
                .server(KNOWN_SERVER)
                .port(Some(53))
                .extra("-p")
                .extra("53")
                .address(KNOWN_HOST),
        ),
        (
            "too many arguments",
            "two trailing addresses",
            base()
                .server(KNOWN_SERVER)
                .extra(OTHER_HOST)
                .address(KNOWN_HOST),
        ),
        (
            "non numeric port",
            "-p value is not a number",
            base()
                .server(KNOWN_SERVER)
                .extra("-p")
                .extra("abc")
                .address(KNOWN_HOST),
        ),
        (
            "reverse of hostname",
            "-x with a name instead of an address",
            base().reverse().server(KNOWN_SERVER).address(KNOWN_HOST),
        ),
        (
            "misordered server value",
            "-s consumes the following flag as its value",
            base()
                .extra("-s")
                .extra("-r")
                .extra(KNOWN_SERVER)
                .address(KNOWN_HOST),
        ),
    ];
    let mut cases: Vec<TestCase> = cases
        .into_iter()
        .map(|(name, description, invocation)| {
            TestCase::new(name, description, invocation.render(), Expectation::failure())
        })
        .collect();
    // Unknown flag ahead of every known option.
    cases.insert(
        3,
        TestCase::new(
            "invalid option",
            "unknown option -z",
            render_tokens([binary, "-z", "-s", KNOWN_SERVER, KNOWN_HOST]),
            Expectation::failure(),
        ),
    );
    cases
}

fn validate_server(server: &str) -> Result<(), Error> {
    if IpAddr::from_str(server).is_ok() || parse_host(server).is_ok() {
        return Ok(());
    }
    Err(Error::InvalidMatrixEntry {
        kind: "server",
        value: server.to_string(),
    })
}

fn parse_host(host: &str) -> Result<Name, Error> {
    let invalid = || Error::InvalidMatrixEntry {
        kind: "host",
        value: host.to_string(),
    };
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Name::from_ascii(host).map_err(|_| invalid())
}

fn parse_address(address: &str) -> Result<IpAddr, Error> {
    IpAddr::from_str(address).map_err(|_| Error::InvalidMatrixEntry {
        kind: "address",
        value: address.to_string(),
    })
}
