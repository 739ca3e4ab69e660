mod cli;
mod error;
mod project;
mod watch;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use crate::project::Project;
use clap::Parser;
use exn::ResultExt;
use iconsprite_config::Settings;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "iconsprite failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).or_raise(|| ErrorKind::Configuration)?;
    if let Some(out) = cli.out {
        settings.out_dir = out;
    }
    settings.dev |= cli.command.dev();
    let base = std::env::current_dir().or_raise(|| ErrorKind::Directory(".".into()))?;
    let project = Project::open(&settings, &base)?;
    match cli.command {
        Command::Build { .. } => {
            project.build().await?;
            Ok(())
        },
        Command::Watch => watch::run(&project).await,
    }
}
