//! `shakedown env` — environment verdict.

use anyhow::Result;
use shakedown_core::environment::VenvManager;
use shakedown_forensics::ExitStatus;

use super::Session;
use crate::cli::OutputFormat;

pub fn execute(session: &Session) -> Result<ExitStatus> {
    let state = VenvManager::global().state();
    match session.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(state)?),
        OutputFormat::Console => {
            match (state.in_virtual_env(), state.root_path(), state.source()) {
                (true, Some(root), Some(source)) => {
                    println!("isolated environment: {} (via {source})", root.display());
                }
                _ => println!("no isolated environment"),
            }
            for warning in state.warnings() {
                println!("warning: {warning}");
            }
        }
    }
    Ok(ExitStatus::Clean)
}
