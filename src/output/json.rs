//! JSON output helpers.
//!
//! Provides the error-object formatter used by all `--json` code paths when
//! a command fails, plus the result objects for the install and permission
//! commands.

use anyhow::{Context, Result};

use crate::domain::InstallCompletion;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen in
/// practice — `serde_json` only fails on non-finite floats and maps with
/// non-string keys, neither of which appear here).
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format the install command's result object. `completion` is the
/// platform's final install result when it arrived within the wait window;
/// `null` means the commit was accepted but the transaction is still in
/// flight (or the caller chose not to wait).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_install_result(completion: Option<&InstallCompletion>) -> Result<String> {
    let obj = serde_json::json!({
        "ok": true,
        "committed": true,
        "completion": completion,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format the permission command's status object.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_permission_status(api_level: u32, gated: bool, granted: bool) -> Result<String> {
    let obj = serde_json::json!({
        "apiLevel": api_level,
        "gated": gated,
        "granted": granted,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
