//! Application service — the installer gate.
//!
//! Accepts an install request, verifies the unknown-sources permission,
//! stages the artifact into a platform installer session, and commits it.
//! All I/O is routed through injected port traits.

use anyhow::Context;

use crate::application::ports::{
    ArtifactStore, CompletionSink, InstallerSession, PackageInstaller, PermissionProbe,
    ProgressReporter,
};
use crate::domain::{
    ArtifactProbe, InstallError, InstallOutcome, InstallRequest, SESSION_WRITE_NAME, SessionParams,
    UNKNOWN_SOURCES_API_LEVEL, validate_artifact_path,
};

/// Drive one install request through the platform installer.
///
/// Returns `Committed` once the platform accepts the session commit — the
/// install transaction itself finishes asynchronously and reports through
/// `completion`. Returns `PermissionRequired` without touching the artifact
/// or the installer when the unknown-sources permission is missing; the
/// caller directs the user to the settings surface and re-issues the
/// request afterward.
///
/// The session handle is released exactly once on every path, including
/// when a write or the commit fails. An uncommitted session is abandoned
/// on release.
///
/// # Errors
///
/// Returns [`InstallError`] for an empty path, a missing or non-regular
/// artifact, or any failure during session open, write, sync, or commit.
/// All errors are terminal for this request — no retry is attempted.
pub async fn install(
    installer: &impl PackageInstaller,
    permissions: &impl PermissionProbe,
    artifacts: &impl ArtifactStore,
    reporter: &impl ProgressReporter,
    request: &InstallRequest,
    completion: CompletionSink,
) -> Result<InstallOutcome, InstallError> {
    let path = validate_artifact_path(&request.artifact_path)?;

    // Permission gate first: a missing grant short-circuits before the
    // artifact is touched. Platforms predating the unknown-sources
    // permission model skip the check entirely.
    let api_level = permissions
        .api_level()
        .await
        .context("querying platform API level")
        .map_err(transaction)?;
    if api_level >= UNKNOWN_SOURCES_API_LEVEL {
        let granted = permissions
            .can_install_packages()
            .await
            .context("querying install permission")
            .map_err(transaction)?;
        if !granted {
            return Ok(InstallOutcome::PermissionRequired);
        }
    }

    match artifacts
        .stat(path)
        .await
        .with_context(|| format!("probing artifact {}", path.display()))
        .map_err(transaction)?
    {
        ArtifactProbe::Missing => {
            return Err(InstallError::NotFound(request.artifact_path.clone()));
        }
        ArtifactProbe::NotAFile => {
            return Err(InstallError::NotAFile(request.artifact_path.clone()));
        }
        ArtifactProbe::File(_) => {}
    }

    let bytes = artifacts
        .read(path)
        .await
        .with_context(|| format!("reading artifact {}", path.display()))
        .map_err(transaction)?;

    reporter.step(&format!("Opening installer session ({} bytes)", bytes.len()));
    let mut session = installer
        .create_session(&SessionParams::default())
        .await
        .context("creating installer session")
        .map_err(transaction)?;

    let staged = stage_and_commit(&mut session, &bytes, completion, reporter).await;
    let closed = session
        .close()
        .await
        .context("releasing installer session");

    match (staged, closed) {
        (Ok(()), Ok(())) => {
            reporter.success("Install session committed");
            Ok(InstallOutcome::Committed)
        }
        (Ok(()), Err(close_err)) => Err(transaction(close_err)),
        (Err(stage_err), Ok(())) => Err(stage_err),
        (Err(stage_err), Err(close_err)) => {
            // The staging failure is the actionable error; the release
            // failure must not mask it.
            reporter.warn(&format!("releasing installer session also failed: {close_err:#}"));
            Err(stage_err)
        }
    }
}

/// Stage the artifact bytes and commit the session. The caller releases the
/// session handle afterward on both the success and the error path.
async fn stage_and_commit(
    session: &mut impl InstallerSession,
    bytes: &[u8],
    completion: CompletionSink,
    reporter: &impl ProgressReporter,
) -> Result<(), InstallError> {
    let len = bytes.len() as u64;
    session
        .write(SESSION_WRITE_NAME, 0, len, bytes)
        .await
        .context("staging artifact into session")
        .map_err(transaction)?;
    session
        .sync()
        .await
        .context("syncing staged artifact")
        .map_err(transaction)?;

    reporter.step("Committing install session");
    session
        .commit(completion)
        .await
        .context("committing install session")
        .map_err(transaction)?;
    Ok(())
}

/// Flatten a port failure (with its context chain) into the terminal
/// transaction error.
fn transaction(err: anyhow::Error) -> InstallError {
    InstallError::Transaction(format!("{err:#}"))
}
