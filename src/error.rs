//! Error types for skiff
//!
//! Uses `thiserror` for library errors; the binary boundary wraps them in
//! `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for skiff operations
pub type DeployResult<T> = Result<T, DeployError>;

/// Main error type for skiff operations
///
/// Every variant except `HookConfigInvalid` is terminal for a deployment run:
/// it propagates to `main`, is logged at error severity, and the process
/// exits non-zero. Invalid hook configuration is reported and the hook is
/// skipped; the run continues.
#[derive(Error, Debug)]
pub enum DeployError {
    /// No config file in the working directory
    #[error("cannot find {file} in the current directory")]
    ConfigMissing { file: &'static str },

    /// Config file present but cannot be parsed
    #[error("cannot read config file: {reason}")]
    ConfigUnreadable { reason: String },

    /// Required config field absent or empty
    #[error("config file should contain key '{field}'")]
    MissingField { field: &'static str },

    /// local_path does not exist or is not a directory
    #[error("local path '{path}' {reason}")]
    InvalidLocalPath { path: PathBuf, reason: &'static str },

    /// remote_path exists but is not a directory
    #[error("the remote path '{path}' exists, but it is not a directory")]
    RemotePathConflict { path: String },

    /// Network or authentication failure while connecting
    #[error("cannot connect to {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    /// Remote operation failed mid-run (probe, mkdir, rmdir, upload)
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// Hook list is present but not a list of strings (recoverable)
    #[error("shell hook configuration for '{stage}' is not a list of commands")]
    HookConfigInvalid { stage: &'static str },

    /// Interactive prompt could not be read
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// Operator declined a confirmation gate
    #[error("aborted by user")]
    Aborted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<dialoguer::Error> for DeployError {
    fn from(err: dialoguer::Error) -> Self {
        DeployError::Prompt(err.to_string())
    }
}
