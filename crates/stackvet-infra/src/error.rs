//! Error types for the provisioning and resource-query adapters.

use thiserror::Error;

/// Errors that can occur in the adapter layer.
#[derive(Error, Debug)]
pub enum InfraError {
    /// A terraform subcommand exited non-zero.
    #[error("terraform {command} failed with exit code {exit_code}: {stderr}")]
    Terraform {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// A terraform subcommand exceeded its time budget.
    #[error("terraform {command} timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// The terraform binary could not be started.
    #[error("failed to spawn terraform {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// `terraform output -json` produced something unparseable.
    #[error("failed to parse terraform outputs: {0}")]
    OutputParse(#[from] serde_json::Error),

    /// A queried resource does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// An AWS API call failed.
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
}

/// Result type for adapter operations.
pub type InfraResult<T> = std::result::Result<T, InfraError>;
