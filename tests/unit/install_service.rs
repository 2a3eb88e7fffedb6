//! Unit tests for the installer-gate application service.
//!
//! Every test drives `install()` against recording capability doubles and
//! asserts both the outcome and exactly which capabilities were touched.

#![allow(clippy::expect_used)]

use sideload_cli::application::ports::completion_channel;
use sideload_cli::application::services::install::install;
use sideload_cli::domain::{InstallError, InstallOutcome, InstallRequest};

use crate::mocks::{Artifacts, CountingReporter, FailAt, Installer, NoopReporter, Permissions};

async fn run_install(
    installer: &Installer,
    permissions: &Permissions,
    artifacts: &Artifacts,
    path: &str,
) -> Result<InstallOutcome, InstallError> {
    let (sink, _signal) = completion_channel();
    install(
        installer,
        permissions,
        artifacts,
        &NoopReporter,
        &InstallRequest::new(path),
        sink,
    )
    .await
}

// ── Argument validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn empty_path_is_invalid_argument_with_zero_capability_access() {
    let installer = Installer::healthy();
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "").await;

    assert!(matches!(result, Err(InstallError::EmptyPath)));
    assert_eq!(permissions.api_call_count(), 0);
    assert_eq!(artifacts.stat_call_count(), 0);
    assert_eq!(installer.log.created_count(), 0);
}

#[tokio::test]
async fn blank_path_is_invalid_argument() {
    let installer = Installer::healthy();
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "   ").await;

    assert!(matches!(result, Err(InstallError::EmptyPath)));
    assert_eq!(installer.log.created_count(), 0);
}

// ── Artifact probing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_artifact_is_not_found_without_installer_access() {
    let installer = Installer::healthy();
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::missing();

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    match result {
        Err(InstallError::NotFound(path)) => assert_eq!(path, "/tmp/app.apk"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(artifacts.read_call_count(), 0);
    assert_eq!(installer.log.created_count(), 0);
}

#[tokio::test]
async fn non_regular_artifact_is_rejected() {
    let installer = Installer::healthy();
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::directory();

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/apks").await;

    assert!(matches!(result, Err(InstallError::NotAFile(_))));
    assert_eq!(installer.log.created_count(), 0);
}

// ── Permission gate ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_permission_short_circuits_all_capabilities() {
    let installer = Installer::healthy();
    let permissions = Permissions::denied(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    assert!(matches!(result, Ok(InstallOutcome::PermissionRequired)));
    assert_eq!(artifacts.stat_call_count(), 0);
    assert_eq!(artifacts.read_call_count(), 0);
    assert_eq!(installer.log.created_count(), 0);
    // The gate never opens the settings surface itself.
    assert_eq!(permissions.settings_call_count(), 0);
}

#[tokio::test]
async fn permission_check_is_skipped_below_the_gate_level() {
    let installer = Installer::healthy();
    let permissions = Permissions::denied(25);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    assert!(matches!(result, Ok(InstallOutcome::Committed)));
    assert_eq!(permissions.grant_call_count(), 0);
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn happy_path_drives_the_session_exactly_once() {
    let installer = Installer::healthy();
    let permissions = Permissions::granted(34);
    let bytes = vec![7u8; 4096];
    let artifacts = Artifacts::file(&bytes);

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    assert!(matches!(result, Ok(InstallOutcome::Committed)));
    assert_eq!(installer.log.created_count(), 1);
    assert_eq!(
        installer.log.writes(),
        vec![("package".to_string(), 0, 4096, 4096)]
    );
    assert_eq!(installer.log.sync_count(), 1);
    assert_eq!(installer.log.commit_count(), 1);
    assert_eq!(installer.log.close_count(), 1);
}

#[tokio::test]
async fn completion_signal_carries_the_platform_result() {
    let installer = Installer::healthy();
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");
    let (sink, signal) = completion_channel();

    let result = install(
        &installer,
        &permissions,
        &artifacts,
        &NoopReporter,
        &InstallRequest::new("/tmp/app.apk"),
        sink,
    )
    .await;

    assert!(matches!(result, Ok(InstallOutcome::Committed)));
    let completion = signal.await.expect("completion resolved");
    assert!(completion.succeeded);
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_failure_is_a_transaction_error() {
    let installer = Installer::failing(FailAt::Create);
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    match result {
        Err(InstallError::Transaction(reason)) => {
            assert!(reason.contains("installer backend unavailable"));
        }
        other => panic!("expected Transaction, got {other:?}"),
    }
    // No session ever existed, so there is nothing to close.
    assert_eq!(installer.log.close_count(), 0);
}

#[tokio::test]
async fn write_failure_aborts_without_commit_and_closes_once() {
    let installer = Installer::failing(FailAt::Write);
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    match result {
        Err(InstallError::Transaction(reason)) => {
            assert!(reason.contains("device ran out of space"));
        }
        other => panic!("expected Transaction, got {other:?}"),
    }
    assert_eq!(installer.log.commit_count(), 0);
    assert_eq!(installer.log.close_count(), 1);
}

#[tokio::test]
async fn sync_failure_aborts_without_commit() {
    let installer = Installer::failing(FailAt::Sync);
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    assert!(matches!(result, Err(InstallError::Transaction(_))));
    assert_eq!(installer.log.commit_count(), 0);
    assert_eq!(installer.log.close_count(), 1);
}

#[tokio::test]
async fn commit_failure_still_closes_the_session_once() {
    let installer = Installer::failing(FailAt::Commit);
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    match result {
        Err(InstallError::Transaction(reason)) => assert!(reason.contains("commit rejected")),
        other => panic!("expected Transaction, got {other:?}"),
    }
    assert_eq!(installer.log.close_count(), 1);
}

#[tokio::test]
async fn close_failure_after_a_successful_commit_is_an_error() {
    let installer = Installer::failing(FailAt::Close);
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;

    match result {
        Err(InstallError::Transaction(reason)) => assert!(reason.contains("release failed")),
        other => panic!("expected Transaction, got {other:?}"),
    }
    assert_eq!(installer.log.commit_count(), 1);
}

#[tokio::test]
async fn close_failure_never_masks_the_staging_failure() {
    let installer = Installer::failing(FailAt::WriteAndClose);
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");
    let reporter = CountingReporter::default();
    let (sink, _signal) = completion_channel();

    let result = install(
        &installer,
        &permissions,
        &artifacts,
        &reporter,
        &InstallRequest::new("/tmp/app.apk"),
        sink,
    )
    .await;

    match result {
        Err(InstallError::Transaction(reason)) => {
            assert!(reason.contains("device ran out of space"));
        }
        other => panic!("expected the write failure, got {other:?}"),
    }
    assert_eq!(*reporter.warns.lock().expect("lock"), 1);
}

#[tokio::test]
async fn repeated_failing_installs_do_not_leak_sessions() {
    let installer = Installer::failing(FailAt::Write);
    let permissions = Permissions::granted(34);
    let artifacts = Artifacts::file(b"apk");

    for _ in 0..100 {
        let result = run_install(&installer, &permissions, &artifacts, "/tmp/app.apk").await;
        assert!(matches!(result, Err(InstallError::Transaction(_))));
    }

    assert_eq!(installer.log.created_count(), 100);
    assert_eq!(installer.log.close_count(), 100);
    assert_eq!(installer.log.commit_count(), 0);
}
