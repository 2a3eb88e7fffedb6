//! Package-manager shell adapters.
//!
//! Production implementations of `PackageInstaller` and `PermissionProbe`
//! over the platform's package-manager shell surface: `pm install-create` /
//! `install-write` / `install-commit` / `install-abandon` for the session
//! lifecycle, `appops` and `getprop` for the permission gate, and `am start`
//! for the settings surface. The surface is reached either directly
//! (on-device shell) or through `adb shell` from a host.

use std::process::Output;

use anyhow::{Context, Result, bail};

use crate::application::ports::{
    CommandRunner, CompletionSink, InstallerSession, PackageInstaller, PermissionProbe,
};
use crate::domain::{InstallCompletion, SessionParams};
use crate::infra::command_runner::DEFAULT_CMD_TIMEOUT;

/// Settings action where the user grants the unknown-sources permission.
const UNKNOWN_SOURCES_SETTINGS_ACTION: &str = "android.settings.MANAGE_UNKNOWN_APP_SOURCES";

// ── Transport ─────────────────────────────────────────────────────────────────

/// How the package-manager shell surface is reached.
#[derive(Debug, Clone)]
pub enum PmTransport {
    /// Run platform binaries directly (on-device shell).
    Direct,
    /// Run through `adb [-s serial] shell` from a host.
    Adb { serial: Option<String> },
}

impl PmTransport {
    /// Assemble the host program and argv for a platform shell invocation.
    #[must_use]
    pub fn argv(&self, program: &str, args: &[&str]) -> (String, Vec<String>) {
        match self {
            Self::Direct => (
                program.to_string(),
                args.iter().map(ToString::to_string).collect(),
            ),
            Self::Adb { serial } => {
                let mut assembled = Vec::with_capacity(args.len() + 4);
                if let Some(serial) = serial {
                    assembled.push("-s".to_string());
                    assembled.push(serial.clone());
                }
                assembled.push("shell".to_string());
                assembled.push(program.to_string());
                assembled.extend(args.iter().map(ToString::to_string));
                ("adb".to_string(), assembled)
            }
        }
    }
}

// ── Installer adapter ─────────────────────────────────────────────────────────

/// Production installer and permission capability backed by the
/// package-manager shell surface.
pub struct PmInstaller<R: CommandRunner> {
    runner: R,
    transport: PmTransport,
    requester: String,
}

impl<R: CommandRunner> PmInstaller<R> {
    /// `requester` is the package identity on whose behalf installs happen;
    /// it scopes the permission query and the settings surface.
    #[must_use]
    pub fn new(runner: R, transport: PmTransport, requester: impl Into<String>) -> Self {
        Self {
            runner,
            transport,
            requester: requester.into(),
        }
    }

    /// Run a quick platform probe with the short timeout.
    async fn probe(&self, program: &str, args: &[&str]) -> Result<Output> {
        let (host_program, assembled) = self.transport.argv(program, args);
        let arg_refs: Vec<&str> = assembled.iter().map(String::as_str).collect();
        self.runner
            .run_with_timeout(&host_program, &arg_refs, DEFAULT_CMD_TIMEOUT)
            .await
    }
}

impl<R: CommandRunner + Clone> PackageInstaller for PmInstaller<R> {
    type Session = PmSession<R>;

    async fn create_session(&self, _params: &SessionParams) -> Result<PmSession<R>> {
        // Full-install is the surface's default session mode; `-r` lets the
        // commit replace an already-installed package.
        let output = self
            .probe("pm", &["install-create", "-r"])
            .await
            .context("running pm install-create")?;
        ensure_pm_success(&output, "pm install-create")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = parse_session_id(&stdout)
            .with_context(|| format!("unrecognized install-create output: {}", stdout.trim()))?;
        Ok(PmSession {
            runner: self.runner.clone(),
            transport: self.transport.clone(),
            id,
            committed: false,
        })
    }
}

impl<R: CommandRunner> PermissionProbe for PmInstaller<R> {
    async fn api_level(&self) -> Result<u32> {
        let output = self
            .probe("getprop", &["ro.build.version.sdk"])
            .await
            .context("running getprop")?;
        ensure_status(&output, "getprop")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_api_level(&stdout)
            .with_context(|| format!("unrecognized platform API level: {}", stdout.trim()))
    }

    async fn can_install_packages(&self) -> Result<bool> {
        let output = self
            .probe("appops", &["get", &self.requester, "REQUEST_INSTALL_PACKAGES"])
            .await
            .context("running appops get")?;
        ensure_status(&output, "appops get")?;
        Ok(parse_appops_grant(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn open_install_settings(&self) -> Result<()> {
        let uri = format!("package:{}", self.requester);
        let output = self
            .probe(
                "am",
                &["start", "-a", UNKNOWN_SOURCES_SETTINGS_ACTION, "-d", &uri],
            )
            .await
            .context("running am start")?;
        ensure_status(&output, "am start")
    }
}

// ── Session adapter ───────────────────────────────────────────────────────────

/// One transactional install session on the pm surface.
pub struct PmSession<R: CommandRunner> {
    runner: R,
    transport: PmTransport,
    id: u32,
    committed: bool,
}

impl<R: CommandRunner> PmSession<R> {
    /// Session id assigned by the platform.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl<R: CommandRunner> InstallerSession for PmSession<R> {
    async fn write(&mut self, name: &str, offset: u64, len: u64, bytes: &[u8]) -> Result<()> {
        anyhow::ensure!(
            offset == 0,
            "the pm surface stages a single stream; nonzero offsets are unsupported"
        );
        let id = self.id.to_string();
        let size = len.to_string();
        let (host_program, assembled) = self
            .transport
            .argv("pm", &["install-write", "-S", &size, &id, name, "-"]);
        let arg_refs: Vec<&str> = assembled.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_stdin(&host_program, &arg_refs, bytes)
            .await
            .context("running pm install-write")?;
        ensure_pm_success(&output, "pm install-write")
    }

    async fn sync(&mut self) -> Result<()> {
        // The surface exposes no per-session fsync; the installer daemon
        // makes the staged bytes durable when the session commits.
        Ok(())
    }

    async fn commit(&mut self, completion: CompletionSink) -> Result<()> {
        let id = self.id.to_string();
        // The platform consumes the session whether or not the commit
        // succeeds; it must not be abandoned afterward.
        self.committed = true;
        let (host_program, assembled) = self.transport.argv("pm", &["install-commit", &id]);
        let arg_refs: Vec<&str> = assembled.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run(&host_program, &arg_refs)
            .await
            .context("running pm install-commit")?;

        let result = parse_commit_result(&output);
        let succeeded = result.succeeded;
        let message = result.message.clone();
        completion.resolve(result);
        if succeeded {
            Ok(())
        } else {
            bail!("pm install-commit reported: {message}")
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.committed {
            return Ok(());
        }
        let id = self.id.to_string();
        let (host_program, assembled) = self.transport.argv("pm", &["install-abandon", &id]);
        let arg_refs: Vec<&str> = assembled.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_timeout(&host_program, &arg_refs, DEFAULT_CMD_TIMEOUT)
            .await
            .context("running pm install-abandon")?;
        ensure_pm_success(&output, "pm install-abandon")
    }
}

// ── Output parsing ────────────────────────────────────────────────────────────

/// Fail when the process exited non-zero, carrying its output as the reason.
fn ensure_status(output: &Output, what: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    bail!("{what} failed: {}", detail.trim())
}

/// `pm` subcommands report success as a `Success` line; a zero exit status
/// alone is not enough.
fn ensure_pm_success(output: &Output, what: &str) -> Result<()> {
    ensure_status(output, what)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stdout.contains("Success") || stderr.contains("Success") {
        Ok(())
    } else {
        let text = if stdout.trim().is_empty() {
            stderr
        } else {
            stdout
        };
        bail!("{what} reported: {}", text.trim())
    }
}

/// Parse the session id from `Success: created install session [1234]`.
#[must_use]
pub fn parse_session_id(stdout: &str) -> Option<u32> {
    let start = stdout.find('[')? + 1;
    let end = stdout[start..].find(']')? + start;
    stdout[start..end].trim().parse().ok()
}

/// Parse `getprop ro.build.version.sdk` output.
#[must_use]
pub fn parse_api_level(stdout: &str) -> Option<u32> {
    stdout.trim().parse().ok()
}

/// Parse `appops get <pkg> REQUEST_INSTALL_PACKAGES` output.
///
/// Only an explicit `allow` counts as granted; `default`, `deny`, `ignore`,
/// and `No operations.` all mean the user still has to grant it.
#[must_use]
pub fn parse_appops_grant(stdout: &str) -> bool {
    stdout.lines().any(|line| {
        let line = line.trim();
        line == "allow"
            || (line.starts_with("REQUEST_INSTALL_PACKAGES") && line.contains("allow"))
    })
}

/// Interpret `pm install-commit` output as the platform's final install
/// result: a `Success` line on a zero exit, or `Failure [REASON]` otherwise.
#[must_use]
pub fn parse_commit_result(output: &Output) -> InstallCompletion {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    if output.status.success() && text.contains("Success") {
        InstallCompletion {
            succeeded: true,
            message: text.to_string(),
        }
    } else {
        InstallCompletion {
            succeeded: false,
            message: if text.is_empty() {
                "install commit produced no output".to_string()
            } else {
                text.to_string()
            },
        }
    }
}
