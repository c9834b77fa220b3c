//! Error types.

/// Error enumerates the possible conformance driver error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a generic IO error occurs, e.g. reading a suite file.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when loading a [`Config`][crate::config::Config] from disk fails due to invalid
    /// JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the configured per-case timeout is zero. A zero timeout would report every
    /// case as hung before the client had a chance to start.
    #[error("timeout must be greater than zero")]
    InvalidTimeout,

    /// Returned when the configured client binary is an empty string.
    #[error("client binary must not be empty")]
    EmptyBinary,

    /// Returned when a server, host or address in the
    /// [`Matrix`][crate::config::Matrix] can't be used to build a valid query.
    #[error("invalid {kind} in matrix: \"{value}\"")]
    InvalidMatrixEntry { kind: &'static str, value: String },

    /// Returned when two cases in one suite end up with the same test name.
    #[error("duplicate test case name: \"{0}\"")]
    DuplicateCase(String),

    /// Returned when the shell used to run a case can't be started at all.
    #[error("failed to spawn \"{shell}\"")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },
}
