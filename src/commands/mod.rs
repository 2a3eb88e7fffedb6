//! Command implementations

pub mod install;
pub mod permission;
pub mod version;

use anyhow::Result;

/// Exit code when the unknown-sources permission must be granted before an
/// install can proceed. Distinct from failure (1) and usage errors (2) so
/// scripted callers can re-issue the request after the grant.
pub const EXIT_PERMISSION_REQUIRED: u8 = 3;

/// Ask the user for confirmation.
///
/// When `non_interactive` is `true` (`--yes` flag or the `CI` environment
/// variable), returns `default` immediately without prompting.
///
/// # Errors
///
/// Returns an error if the terminal prompt fails (e.g. no TTY available).
pub(crate) fn confirm(prompt: &str, default: bool, non_interactive: bool) -> Result<bool> {
    if non_interactive {
        return Ok(default);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?;
    Ok(confirmed)
}
