//! Error types for agent-snap

use thiserror::Error;

use crate::revision::Confinement;

/// Errors raised while resolving or installing the pinned snap.
///
/// Use [`SnapError::is_unsupported_platform`] to tell an environment mismatch
/// apart from a failed install.
#[derive(Error, Debug)]
pub enum SnapError {
    /// No pinned revision exists for this (confinement, architecture) pair
    #[error("Snap spec not found for arch={arch} and confinement={confinement}")]
    SpecNotFound {
        arch: String,
        confinement: Confinement,
    },

    /// The package manager rejected the install, refresh or hold
    #[error(transparent)]
    Snapctl(#[from] SnapctlError),
}

impl SnapError {
    /// True when the host cannot be served by any pinned revision.
    pub fn is_unsupported_platform(&self) -> bool {
        matches!(self, SnapError::SpecNotFound { .. })
    }
}

/// Errors reported by a [`SnapManager`](crate::SnapManager) implementation.
#[derive(Error, Debug)]
pub enum SnapctlError {
    /// The `snap` executable could not be spawned
    #[error("snapd is not available: {program} could not be executed")]
    SnapdUnavailable { program: String },

    /// The store has no snap with this name
    #[error("Snap not found: {0}")]
    NotFound(String),

    /// A `snap` invocation exited unsuccessfully
    #[error("snap command failed: `{command}`: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// `snap list` printed something we could not read
    #[error("Unexpected snap list output: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
