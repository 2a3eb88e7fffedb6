//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;

use anyhow::Result;
use tokio::sync::oneshot;

use crate::domain::{ArtifactProbe, InstallCompletion, SessionParams};

// ── Completion channel ────────────────────────────────────────────────────────

/// Write half of the one-shot completion channel handed to
/// [`InstallerSession::commit`]. The platform's final install result arrives
/// here, decoupled from commit-acceptance.
pub struct CompletionSink(oneshot::Sender<InstallCompletion>);

impl CompletionSink {
    /// Deliver the platform's final install result. Delivery is best-effort:
    /// a caller that dropped the receiving half simply misses the signal.
    pub fn resolve(self, completion: InstallCompletion) {
        let _ = self.0.send(completion);
    }
}

/// Read half of the completion channel.
pub type CompletionSignal = oneshot::Receiver<InstallCompletion>;

/// Create a connected completion sink/signal pair for one install request.
#[must_use]
pub fn completion_channel() -> (CompletionSink, CompletionSignal) {
    let (tx, rx) = oneshot::channel();
    (CompletionSink(tx), rx)
}

// ── Installer Ports ───────────────────────────────────────────────────────────

/// A transactional write-session obtained from [`PackageInstaller`].
///
/// The session is exclusively owned by the install call that created it and
/// must be closed exactly once on every path out of that call. Closing an
/// uncommitted session abandons it; the platform discards the staged bytes.
#[allow(async_fn_in_trait)]
pub trait InstallerSession {
    /// Stage `bytes` into the session under `name` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged write is rejected or fails mid-stream.
    async fn write(&mut self, name: &str, offset: u64, len: u64, bytes: &[u8]) -> Result<()>;

    /// Request a durability sync of everything staged so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync is refused.
    async fn sync(&mut self) -> Result<()>;

    /// Commit the session. The final install result is reported through
    /// `completion`, which implementations may resolve before or after this
    /// call returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the commit.
    async fn commit(&mut self, completion: CompletionSink) -> Result<()>;

    /// Release the session handle. Abandons the session if it was never
    /// committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be released cleanly.
    async fn close(&mut self) -> Result<()>;
}

/// The platform's session-based installer capability.
#[allow(async_fn_in_trait)]
pub trait PackageInstaller {
    type Session: InstallerSession;

    /// Acquire a new transactional write-session.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to create a session.
    async fn create_session(&self, params: &SessionParams) -> Result<Self::Session>;
}

// ── Permission Port ───────────────────────────────────────────────────────────

/// The platform's install-permission capability.
#[allow(async_fn_in_trait)]
pub trait PermissionProbe {
    /// The platform API level, used to gate the unknown-sources check.
    ///
    /// # Errors
    ///
    /// Returns an error if the level cannot be determined.
    async fn api_level(&self) -> Result<u32>;

    /// Whether the requesting identity may install packages from unknown
    /// sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the permission state cannot be queried.
    async fn can_install_packages(&self) -> Result<bool>;

    /// Open the platform settings surface where the user grants the
    /// permission, scoped to the requesting identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings surface cannot be opened.
    async fn open_install_settings(&self) -> Result<()>;
}

// ── Artifact Port ─────────────────────────────────────────────────────────────

/// Abstracts access to the local artifact so the gate can be tested without
/// a real filesystem.
#[allow(async_fn_in_trait)]
pub trait ArtifactStore {
    /// Probe the artifact path without reading its contents.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures other than the path being
    /// missing or not a regular file — those are [`ArtifactProbe`] variants.
    async fn stat(&self, path: &Path) -> Result<ArtifactProbe>;

    /// Read the complete artifact contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be opened or read.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;

    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}
