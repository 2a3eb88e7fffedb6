//! Sideload CLI - Stage and commit local APK artifacts through the platform package installer

use std::process::ExitCode;

use clap::Parser;

use sideload_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
