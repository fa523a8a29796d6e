//! `shakedown tools` — tool availability table.

use anyhow::Result;
use shakedown_core::environment::{EnvironmentProbe, ToolAvailabilityChecker, VenvManager};
use shakedown_forensics::ExitStatus;

use super::Session;
use crate::cli::OutputFormat;

pub fn execute(session: &Session, names: Vec<String>) -> Result<ExitStatus> {
    let names = if names.is_empty() {
        session.config.forensics.tools.clone()
    } else {
        names
    };

    let checker = ToolAvailabilityChecker::new(VenvManager::global(), EnvironmentProbe::from_env());
    let table = checker.build_table(&names);

    match session.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        OutputFormat::Console => {
            if table.is_empty() {
                println!("no tools configured");
            }
            for (name, availability) in table.iter() {
                let location = availability
                    .path
                    .as_ref()
                    .map_or_else(|| "not found".to_string(), |p| p.display().to_string());
                let venv = if availability.uses_venv { " [venv]" } else { "" };
                println!("{name}: {location}{venv}");
            }
        }
    }
    Ok(ExitStatus::Clean)
}
