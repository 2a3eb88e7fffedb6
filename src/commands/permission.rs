//! `sideload permission` — report the unknown-sources permission state and
//! optionally open the settings surface that grants it.

use anyhow::Result;
use clap::Args;

use crate::application::ports::PermissionProbe;
use crate::commands::EXIT_PERMISSION_REQUIRED;
use crate::domain::UNKNOWN_SOURCES_API_LEVEL;
use crate::output::{OutputContext, json};

/// Arguments for the permission command.
#[derive(Args)]
pub struct PermissionArgs {
    /// Open the platform settings surface to grant the permission
    #[arg(long)]
    pub open: bool,
}

/// Run `sideload permission [--open]`.
///
/// Exit code 0 when installs may proceed (granted, or the platform predates
/// the permission model); [`EXIT_PERMISSION_REQUIRED`] otherwise.
///
/// # Errors
///
/// Returns an error if the platform cannot be queried or the settings
/// surface cannot be opened.
pub async fn run(
    ctx: &OutputContext,
    permissions: &impl PermissionProbe,
    args: &PermissionArgs,
    json_mode: bool,
) -> Result<u8> {
    let api_level = permissions.api_level().await?;
    let gated = api_level >= UNKNOWN_SOURCES_API_LEVEL;
    let granted = if gated {
        permissions.can_install_packages().await?
    } else {
        true
    };

    if json_mode {
        println!("{}", json::format_permission_status(api_level, gated, granted)?);
    } else if !gated {
        ctx.info(&format!(
            "Platform API level {api_level} predates the unknown-sources permission model; installs are not gated."
        ));
    } else if granted {
        ctx.success("Unknown-sources install permission is granted.");
    } else {
        ctx.warn("Unknown-sources install permission is not granted.");
    }

    if gated && !granted && args.open {
        permissions.open_install_settings().await?;
        if !json_mode {
            ctx.info("Grant the permission in the settings screen, then re-run the install.");
        }
    }

    Ok(if granted { 0 } else { EXIT_PERMISSION_REQUIRED })
}
