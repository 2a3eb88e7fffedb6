//! Install request, outcome, and session value types.

use std::path::Path;

use serde::Serialize;

use crate::domain::error::InstallError;

/// Platform API level that introduced the unknown-sources permission model.
/// Below this level the permission gate is skipped entirely.
pub const UNKNOWN_SOURCES_API_LEVEL: u32 = 26;

/// Name under which the artifact bytes are staged inside the session.
pub const SESSION_WRITE_NAME: &str = "package";

// ── Request and outcome ───────────────────────────────────────────────────────

/// A single install request. Created per call, never persisted.
pub struct InstallRequest {
    /// Path to the local artifact to stage and commit.
    pub artifact_path: String,
}

impl InstallRequest {
    #[must_use]
    pub fn new(artifact_path: impl Into<String>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
        }
    }
}

/// Outcome of an install request.
///
/// `Committed` means the platform accepted the session commit — the install
/// transaction itself finishes asynchronously and reports through the
/// completion channel, not through this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The session was committed; the platform proceeds with the install.
    Committed,
    /// The unknown-sources permission is missing. Recoverable: the caller
    /// directs the user to the settings surface and re-issues the request.
    PermissionRequired,
}

/// The platform's final install result, delivered out-of-band after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallCompletion {
    /// Whether the install transaction finished successfully.
    pub succeeded: bool,
    /// Human-readable platform message (e.g. a failure reason).
    pub message: String,
}

// ── Session parameters ────────────────────────────────────────────────────────

/// Install mode for a new session. Partial/inherit modes are out of scope —
/// every session stages the complete artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionMode {
    #[default]
    FullInstall,
}

/// Parameters for creating an installer session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionParams {
    pub mode: SessionMode,
}

// ── Artifact metadata ─────────────────────────────────────────────────────────

/// Metadata of a staged-to-be artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactMeta {
    /// Size in bytes.
    pub size: u64,
}

/// Result of probing an artifact path before any installer call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactProbe {
    /// Nothing exists at the path.
    Missing,
    /// The path exists but is not a regular file.
    NotAFile,
    /// A regular file exists.
    File(ArtifactMeta),
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Validate a raw artifact path argument.
///
/// # Errors
///
/// Returns [`InstallError::EmptyPath`] when the path is empty or blank.
pub fn validate_artifact_path(raw: &str) -> Result<&Path, InstallError> {
    if raw.trim().is_empty() {
        return Err(InstallError::EmptyPath);
    }
    Ok(Path::new(raw))
}
