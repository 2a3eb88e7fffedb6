//! `sideload install` — stage a local APK into an installer session and
//! commit it.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::application::ports::{
    ArtifactStore, CompletionSignal, PackageInstaller, PermissionProbe, completion_channel,
};
use crate::application::services::install as install_service;
use crate::commands::EXIT_PERMISSION_REQUIRED;
use crate::domain::error::CODE_PERMISSION_REQUIRED;
use crate::domain::{InstallCompletion, InstallOutcome, InstallRequest};
use crate::output::reporter::TerminalReporter;
use crate::output::{OutputContext, json, progress};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Path to the APK artifact to install
    pub path: String,

    /// Seconds to wait for the platform's final install result after commit
    #[arg(long, default_value_t = 60, conflicts_with = "no_wait")]
    pub wait_secs: u64,

    /// Return immediately once the session commit is accepted
    #[arg(long)]
    pub no_wait: bool,

    /// Open the settings surface without prompting when permission is missing
    #[arg(long)]
    pub open_settings: bool,
}

/// Run `sideload install <path>`.
///
/// Drives the installer gate with the production adapters, then — unless
/// `--no-wait` — waits a bounded time for the platform's out-of-band install
/// result. A committed session is a success (exit 0) even when that result
/// has not arrived yet; a missing permission exits with
/// [`EXIT_PERMISSION_REQUIRED`] after optionally opening the settings
/// surface.
///
/// # Errors
///
/// Returns an error if opening the settings surface or the confirmation
/// prompt fails. Install failures are reported and mapped to exit code 1,
/// not returned as errors.
pub async fn run(
    ctx: &OutputContext,
    installer: &impl PackageInstaller,
    permissions: &impl PermissionProbe,
    artifacts: &impl ArtifactStore,
    args: &InstallArgs,
    json_mode: bool,
    non_interactive: bool,
) -> Result<u8> {
    let request = InstallRequest::new(args.path.clone());
    let (sink, signal) = completion_channel();
    let reporter = TerminalReporter::new(ctx);

    let outcome =
        install_service::install(installer, permissions, artifacts, &reporter, &request, sink)
            .await;

    match outcome {
        Ok(InstallOutcome::Committed) => {
            let completion = if args.no_wait {
                None
            } else {
                wait_for_completion(ctx, signal, args.wait_secs).await
            };
            if json_mode {
                println!("{}", json::format_install_result(completion.as_ref())?);
            } else {
                report_completion(ctx, completion.as_ref());
            }
            Ok(0)
        }
        Ok(InstallOutcome::PermissionRequired) => {
            if json_mode {
                println!(
                    "{}",
                    json::format_error(
                        "Installing from unknown sources requires a one-time permission grant.",
                        CODE_PERMISSION_REQUIRED,
                    )?
                );
            } else {
                ctx.warn("Installing from unknown sources requires a one-time permission grant.");
            }
            offer_settings(ctx, permissions, args.open_settings, non_interactive || json_mode)
                .await?;
            Ok(EXIT_PERMISSION_REQUIRED)
        }
        Err(err) => {
            if json_mode {
                println!("{}", json::format_error(&err.to_string(), err.code())?);
            } else {
                ctx.error(&err.to_string());
            }
            Ok(1)
        }
    }
}

/// Open the unknown-sources settings surface, either unconditionally
/// (`--open-settings`) or after asking the user.
async fn offer_settings(
    ctx: &OutputContext,
    permissions: &impl PermissionProbe,
    open_flag: bool,
    non_interactive: bool,
) -> Result<()> {
    let open = open_flag
        || crate::commands::confirm(
            "Open the unknown-sources settings screen now?",
            false,
            non_interactive,
        )?;
    if open {
        permissions.open_install_settings().await?;
        ctx.info("Grant the permission in the settings screen, then re-run the install.");
    } else {
        ctx.info("Run 'sideload permission --open' to grant it, then re-run the install.");
    }
    Ok(())
}

/// Wait a bounded time for the platform's final install result. `None`
/// means the wait window elapsed or the adapter dropped the sink — the
/// transaction may still be in flight.
async fn wait_for_completion(
    ctx: &OutputContext,
    signal: CompletionSignal,
    wait_secs: u64,
) -> Option<InstallCompletion> {
    let pb = ctx
        .show_progress()
        .then(|| progress::spinner("Waiting for the platform install result"));
    let result = tokio::time::timeout(Duration::from_secs(wait_secs), signal).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    match result {
        Ok(Ok(completion)) => Some(completion),
        _ => None,
    }
}

fn report_completion(ctx: &OutputContext, completion: Option<&InstallCompletion>) {
    match completion {
        Some(c) if c.succeeded => ctx.success("Platform reported the install complete"),
        Some(c) => ctx.warn(&format!("Platform reported the install failed: {}", c.message)),
        None => ctx.info("Commit accepted; the platform finishes the install asynchronously."),
    }
}
