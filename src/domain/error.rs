//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Wire error codes ──────────────────────────────────────────────────────────

/// Error code reported when the unknown-sources permission is missing.
pub const CODE_PERMISSION_REQUIRED: &str = "PERMISSION_REQUIRED";

/// Error code reported for any failure touching the artifact or the
/// installer session.
pub const CODE_INSTALL_ERROR: &str = "INSTALL_ERROR";

/// Error code reported for an empty or blank artifact path.
pub const CODE_INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";

// ── Install errors ────────────────────────────────────────────────────────────

/// Errors terminal for a single install request. A missing permission is
/// not an error — it is the `PermissionRequired` outcome, recoverable by
/// user action.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("No artifact path was provided.")]
    EmptyPath,

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Artifact is not a regular file: {0}")]
    NotAFile(String),

    #[error("Install transaction failed: {0}")]
    Transaction(String),
}

impl InstallError {
    /// The wire error code for this error.
    ///
    /// `NotFound`, `NotAFile`, and `Transaction` all collapse to
    /// `INSTALL_ERROR` on the wire; only the empty-path case is reported
    /// as `INVALID_ARGUMENT`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyPath => CODE_INVALID_ARGUMENT,
            Self::NotFound(_) | Self::NotAFile(_) | Self::Transaction(_) => CODE_INSTALL_ERROR,
        }
    }
}
