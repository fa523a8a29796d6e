//! `shakedown run` — forensic sequence over a target command.

use std::sync::Arc;

use anyhow::Result;
use shakedown_core::config::{CliOverrides, TestRunConfig};
use shakedown_core::environment::VenvManager;
use shakedown_forensics::reporters::console::ConsoleReporter;
use shakedown_forensics::reporters::{create_reporter, Reporter};
use shakedown_forensics::{ExitStatus, ForensicRunner};

use super::{tagged, Session};
use crate::cli::{OutputFormat, RunArgs};

pub fn overrides(args: &RunArgs) -> CliOverrides {
    CliOverrides {
        test_timeout_ms: args.test_timeout_ms,
        coverage_enabled: args.coverage,
        iterations: args.iterations,
        base_timeout_seconds: args.timeout,
        delay_ms: args.delay_ms,
        log_dir: args.log_dir.clone(),
    }
}

pub fn execute(session: &Session, args: RunArgs) -> Result<ExitStatus> {
    let test_run = Arc::new(TestRunConfig::from_config(&session.config));
    let forensics = &session.config.forensics;

    let mut command = args.command;
    if let Some(scope) = &args.scope {
        command.extend(test_run.scope(scope).map_err(tagged)?.iter().cloned());
    }

    let log_dir = session.root.join(forensics.effective_log_dir());
    let runner = ForensicRunner::new(VenvManager::global(), test_run, forensics)
        .with_log_dir(log_dir)
        .with_working_dir(&session.root);

    let report = runner
        .run_sequence(forensics.effective_iterations(), &command)
        .map_err(tagged)?;

    let rendered = match session.format {
        OutputFormat::Console => ConsoleReporter::new(session.use_color).generate(&report),
        OutputFormat::Json => create_reporter(session.format.as_str())
            .ok_or_else(|| format!("no reporter for {}", session.format.as_str()))
            .and_then(|reporter| reporter.generate(&report)),
    }
    .map_err(anyhow::Error::msg)?;
    print!("{rendered}");
    if let Some(reason) = &report.aborted {
        eprintln!("error: {reason}");
    }

    Ok(report.exit_status())
}
