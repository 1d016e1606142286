//! Error types for query-logs.
//!
//! Startup errors are fatal and end the process with [`EXIT_STARTUP_FAILURE`].
//! Fetch errors are transient: the poll loop reports them and tries again.

use attohttpc::StatusCode;
use std::fmt;
use thiserror::Error;

/// Exit code for every failure that happens before the poll loop starts.
pub const EXIT_STARTUP_FAILURE: i32 = 3;

/// A required flag that was not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFlag {
    Hostname,
    ClientId,
    ClientSecret,
}

impl fmt::Display for MissingFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingFlag::Hostname => {
                write!(f, "The tenant hostname is required. Use the -hostname flag.")
            }
            MissingFlag::ClientId => {
                write!(f, "The client ID is required. Use the -clientID flag.")
            }
            MissingFlag::ClientSecret => {
                write!(f, "The client secret is required. Use the -clientSecret flag.")
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Custom filter string is invalid: `{clause}` is not of the form <key>=<value>")]
    InvalidClause { clause: String },
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Transport(#[from] attohttpc::Error),

    #[error("status code: {0}")]
    Status(StatusCode),

    #[error("malformed token response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token response did not contain an access token")]
    EmptyToken,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] attohttpc::Error),

    #[error("status code: {0}")]
    Status(StatusCode),

    #[error("status code: {}", StatusCode::UNAUTHORIZED)]
    Unauthorized,

    #[error("malformed log response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("re-authentication failed: {0}")]
    Auth(#[from] AuthError),
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("{}", join_lines(.0))]
    MissingFlags(Vec<MissingFlag>),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Filter(#[from] FilterError),

    #[error("Unable to get the access token: {0}")]
    Auth(#[from] AuthError),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        EXIT_STARTUP_FAILURE
    }

    /// One diagnostic line per problem, each prefixed with `ERROR: `.
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            StartupError::MissingFlags(flags) => {
                flags.iter().map(|flag| format!("ERROR: {}", flag)).collect()
            }
            StartupError::Usage(usage) => vec![usage.trim_end().to_string()],
            other => vec![format!("ERROR: {}", other)],
        }
    }
}

fn join_lines(flags: &[MissingFlag]) -> String {
    flags
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
