//! `shakedown config` — print the resolved configuration.

use anyhow::Result;
use shakedown_forensics::ExitStatus;

use super::{tagged, Session};

pub fn execute(session: &Session) -> Result<ExitStatus> {
    print!("{}", session.config.to_toml().map_err(tagged)?);
    Ok(ExitStatus::Clean)
}
