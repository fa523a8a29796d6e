pub mod config;
pub mod env;
pub mod parse;
pub mod run;
pub mod tools;

use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use shakedown_core::config::{CliOverrides, ShakedownConfig};
use shakedown_core::environment::VenvManager;
use shakedown_core::errors::ShakedownErrorCode;
use shakedown_forensics::ExitStatus;

use crate::cli::{Cli, Commands, OutputFormat};

/// Settings shared by every subcommand.
pub struct Session {
    pub root: PathBuf,
    pub config: ShakedownConfig,
    pub format: OutputFormat,
    pub use_color: bool,
}

pub fn execute(cli: Cli) -> Result<ExitStatus> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let overrides = match &cli.command {
        Commands::Run(args) => run::overrides(args),
        _ => CliOverrides::default(),
    };
    let config = ShakedownConfig::load(&root, Some(&overrides)).map_err(tagged)?;
    VenvManager::install_global(VenvManager::from_config(&config.environment, &root));

    let session = Session {
        root,
        config,
        format: cli.format,
        use_color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    match cli.command {
        Commands::Run(args) => run::execute(&session, args),
        Commands::Parse(args) => parse::execute(&session, args),
        Commands::Tools { names } => tools::execute(&session, names),
        Commands::Env => env::execute(&session),
        Commands::Config => config::execute(&session),
    }
}

/// Wrap a library error, keeping its stable code in the message.
pub fn tagged<E>(err: E) -> anyhow::Error
where
    E: ShakedownErrorCode + Display,
{
    anyhow::anyhow!(err.tagged_string())
}
