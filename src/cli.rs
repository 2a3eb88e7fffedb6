//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::infra::command_runner::{DEFAULT_STAGE_TIMEOUT, TokioCommandRunner};
use crate::infra::fs::LocalArtifacts;
use crate::infra::pm::{PmInstaller, PmTransport};
use crate::output::OutputContext;

/// Stage and commit local APK artifacts through the platform package installer
#[derive(Parser)]
#[command(
    name = "sideload",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Skip interactive prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Reach the device through adb instead of running pm directly
    #[arg(long, global = true)]
    pub adb: bool,

    /// Device serial for adb (implies --adb)
    #[arg(long, global = true, env = "ANDROID_SERIAL")]
    pub serial: Option<String>,

    /// Package identity performing the install (scopes the permission
    /// check and the settings surface)
    #[arg(long, global = true, default_value = "com.android.shell")]
    pub requester: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Stage a local APK into an installer session and commit it
    Install(commands::install::InstallArgs),

    /// Check or grant the unknown-sources install permission
    Permission(commands::permission::PermissionArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command, returning the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails outside its mapped exit codes.
    pub async fn run(self) -> Result<u8> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            adb,
            serial,
            requester,
            command,
        } = self;
        let non_interactive = yes || std::env::var("CI").is_ok();
        match command {
            Command::Version => {
                commands::version::run(json);
                Ok(0)
            }
            Command::Install(args) => {
                // JSON mode owns stdout; suppress the human progress lines.
                let ctx = OutputContext::new(no_color, quiet || json);
                let installer = pm_installer(adb, serial, requester);
                commands::install::run(
                    &ctx,
                    &installer,
                    &installer,
                    &LocalArtifacts,
                    &args,
                    json,
                    non_interactive,
                )
                .await
            }
            Command::Permission(args) => {
                let ctx = OutputContext::new(no_color, quiet || json);
                let installer = pm_installer(adb, serial, requester);
                commands::permission::run(&ctx, &installer, &args, json).await
            }
        }
    }
}

/// Build the production installer over the pm surface, reached directly or
/// through adb.
fn pm_installer(
    adb: bool,
    serial: Option<String>,
    requester: String,
) -> PmInstaller<TokioCommandRunner> {
    let transport = if adb || serial.is_some() {
        PmTransport::Adb { serial }
    } else {
        PmTransport::Direct
    };
    PmInstaller::new(
        TokioCommandRunner::new(DEFAULT_STAGE_TIMEOUT),
        transport,
        requester,
    )
}
