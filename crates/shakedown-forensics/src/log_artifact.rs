//! Per-iteration log artifacts.
//!
//! One file per iteration, `<log_dir>/iteration-NNN.log` (sequence number
//! zero padded to at least three digits). A plain-text header comes first,
//! then the raw stdout and stderr exactly as captured.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use shakedown_core::errors::RunnerError;

use crate::policy::EscalationTrigger;
use crate::process::ProcessOutput;
use crate::state::IterationState;

/// Header fields written at the top of an artifact.
#[derive(Debug, Clone)]
pub struct ArtifactHeader<'a> {
    pub iteration: u32,
    pub started_at: DateTime<Utc>,
    pub timeout_seconds: u64,
    pub command: &'a str,
    pub escalation: Option<EscalationTrigger>,
    pub state: IterationState,
    pub duration_seconds: f64,
}

/// Writes iteration logs into one directory.
#[derive(Debug, Clone)]
pub struct LogArtifactWriter {
    dir: PathBuf,
}

impl LogArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the log directory. Called once before the first iteration.
    pub fn prepare(&self) -> Result<(), RunnerError> {
        fs::create_dir_all(&self.dir).map_err(|source| RunnerError::LogArtifact {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn path_for(&self, iteration: u32) -> PathBuf {
        self.dir.join(artifact_file_name(iteration))
    }

    /// Write one artifact, replacing any file left by an earlier batch.
    pub fn write(
        &self,
        header: &ArtifactHeader<'_>,
        output: &ProcessOutput,
    ) -> Result<PathBuf, RunnerError> {
        let path = self.path_for(header.iteration);
        let to_err = |source| RunnerError::LogArtifact {
            path: path.clone(),
            source,
        };

        let mut file = fs::File::create(&path).map_err(to_err)?;
        file.write_all(render_header(header, output).as_bytes())
            .and_then(|()| file.write_all(b"--- stdout ---\n"))
            .and_then(|()| file.write_all(&output.stdout))
            .and_then(|()| file.write_all(b"\n--- stderr ---\n"))
            .and_then(|()| file.write_all(&output.stderr))
            .and_then(|()| file.flush())
            .map_err(to_err)?;

        Ok(path)
    }
}

pub fn artifact_file_name(iteration: u32) -> String {
    format!("iteration-{iteration:03}.log")
}

fn render_header(header: &ArtifactHeader<'_>, output: &ProcessOutput) -> String {
    let mut text = String::new();
    let escalation = header
        .escalation
        .map_or_else(|| "none".to_string(), |t| t.to_string());
    let exit = match (output.exit_code, output.signal) {
        (Some(code), _) => code.to_string(),
        (None, Some(signal)) => format!("none (signal {signal})"),
        (None, None) => "none".to_string(),
    };

    let _ = writeln!(text, "iteration: {}", header.iteration);
    let _ = writeln!(
        text,
        "timestamp: {}",
        header.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let _ = writeln!(text, "timeout_seconds: {}", header.timeout_seconds);
    let _ = writeln!(text, "command: {}", header.command);
    let _ = writeln!(text, "escalation: {escalation}");
    let _ = writeln!(text, "state: {}", header.state);
    let _ = writeln!(text, "exit_code: {exit}");
    let _ = writeln!(text, "duration_seconds: {:.3}", header.duration_seconds);
    text
}
