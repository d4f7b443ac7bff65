use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced while provisioning or probing the database sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("docker is not installed or not on PATH")]
    DockerUnavailable,

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{} has local edits; refusing to overwrite", path.display())]
    ComposeDrift { path: PathBuf },

    #[error("Database was not ready after {attempts} attempts: {last_error}")]
    NotReady { attempts: u32, last_error: String },
}
