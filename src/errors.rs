// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for provisioning operations

use std::path::PathBuf;

use thiserror::Error;

use crate::state_machine::TransitionError;

/// Errors that can occur while reconciling infrastructure
///
/// Every component returns these as values; nothing is raised across a
/// component boundary. The engine stops at the first one it sees.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Status query failed or returned a state we cannot map
    #[error("Probe failed for {identity}: {reason}")]
    Probe { identity: String, reason: String },

    /// A network resource could not be found or created
    #[error("Network bootstrap failed at {step}: {reason}")]
    Bootstrap { step: String, reason: String },

    /// The provisioning document could not be read or rewritten
    #[error("Cannot write provisioning document {}: {reason}", .path.display())]
    ConfigWrite { path: PathBuf, reason: String },

    /// Provider boot command failed
    #[error("Boot failed for {identity}: {reason}")]
    BootFailed { identity: String, reason: String },

    /// Re-applying provisioning on a running node failed
    #[error("Reload failed for {identity}: {reason}")]
    ReloadFailed { identity: String, reason: String },

    /// No descriptor exists for the identity
    #[error("Host {0} not found in catalog")]
    HostNotFound(String),

    /// Descriptor exists but could not be read or parsed
    #[error("Host catalog error for {hostname}: {reason}")]
    Catalog { hostname: String, reason: String },

    /// VM block failed validation before rendering
    #[error("Invalid VM block for {hostname}: {reason}")]
    InvalidBlock { hostname: String, reason: String },

    /// Hostname already has a block in the document
    #[error("Host {0} is already defined in the provisioning document")]
    DuplicateBlock(String),

    /// Neither member of the identity chain can be used at the desired location
    #[error("No usable identity in {chain}: {reason}")]
    NoUsableIdentity { chain: String, reason: String },

    /// Reconciliation machine was driven past a terminal state
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;

impl ProvisionError {
    pub(crate) fn bootstrap(step: impl Into<String>, err: impl ToString) -> Self {
        ProvisionError::Bootstrap {
            step: step.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn config_write(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        ProvisionError::ConfigWrite {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

