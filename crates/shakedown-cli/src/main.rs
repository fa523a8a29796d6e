use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use shakedown_forensics::ExitStatus;

mod cli;
mod commands;

use cli::Cli;

fn main() -> ExitCode {
    shakedown_core::tracing::init_tracing();
    // Usage errors exit 3; clap's default of 2 collides with ProcessFailures.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => exit_code(ExitStatus::HarnessError),
            };
        }
    };

    let status = match commands::execute(cli) {
        Ok(status) => status,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitStatus::HarnessError
        }
    };
    exit_code(status)
}

fn exit_code(status: ExitStatus) -> ExitCode {
    ExitCode::from(u8::try_from(status.code()).unwrap_or(3))
}
