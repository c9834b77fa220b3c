//! DNS Conformance
//!
//! A black-box acceptance test driver for command line DNS clients of the form:
//!
//! ```text
//! dns [-r] [-x] [-6] -s server [-p port] address
//! ```
//!
//! The client under test is never linked or inspected. Each [test case][case::TestCase] is a
//! shell command line that is run as a subprocess with a wall clock limit; its exit code
//! (and optionally stdout/stderr) is compared against an [expectation][case::Expectation].
//!
//! Cases come from three places, in this order:
//!
//! 1. the [query matrix][generator::query_matrix]: forward and reverse lookups for every
//!    combination of server, name/address, iterative/recursive mode and address family, all
//!    expected to succeed (exit code 0).
//! 2. the [invalid-argument battery][generator::invalid_argument_cases]: malformed command
//!    lines, all expected to fail (nonzero exit code).
//! 3. hand-written cases from a JSON [suite file][config::Config].
//!
//! A client that does not exit within the timeout (2 seconds by default) is terminated and
//! reported with exit code 69 and the message `Command timed out`.
#![warn(clippy::pedantic)]

pub mod case;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod invocation;
pub mod report;
pub mod runner;

pub use case::{Expectation, TestCase, Verdict};
pub use config::{Config, SharedConfig};
pub use executor::{Executor, Outcome, ShellExecutor};
pub use generator::generate;
pub use report::Report;
pub use runner::Runner;
