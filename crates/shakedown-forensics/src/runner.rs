//! ForensicRunner — run one command N times in sequence and keep evidence.
//!
//! Per batch:
//! 1. Read the environment verdict and build the tool availability table,
//!    once.
//! 2. Resolve the target program through that table. A binary found inside
//!    the isolated environment is spawned by absolute path; anything else
//!    is spawned by name through `PATH`.
//! 3. Run iterations strictly one after another. Each picks its timeout
//!    from [`TimeoutPolicy`] based on how the previous iteration ended.
//! 4. Parse stdout and stderr of every iteration, write its log artifact
//!    and record the outcome.
//!
//! Timeouts, nonzero exits, unresolvable tools, unparseable lines, and a
//! failed artifact write stay local to their iteration. Only a spawn
//! failure aborts the batch; the records gathered before it are still
//! returned, with the error in [`ForensicReport::aborted`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use shakedown_analysis::violations::{ParseOutcome, ViolationAggregator, ViolationSummary};
use shakedown_core::config::{ForensicConfig, TestRunConfig};
use shakedown_core::environment::{
    EnvironmentProbe, EnvironmentVerdict, ToolAvailabilityChecker, ToolAvailabilityTable,
};
use shakedown_core::errors::{RunnerError, ShakedownErrorCode};

use crate::log_artifact::{ArtifactHeader, LogArtifactWriter};
use crate::policy::TimeoutPolicy;
use crate::process::{CommandSpec, NativeRunner, ProcessOutput, ProcessRunner};
use crate::record::{ExecutionRecord, ForensicReport};
use crate::state::IterationState;

pub struct ForensicRunner<'a> {
    verdict: &'a dyn EnvironmentVerdict,
    probe: EnvironmentProbe,
    process_runner: Box<dyn ProcessRunner>,
    test_run: Arc<TestRunConfig>,
    policy: TimeoutPolicy,
    delay: Duration,
    artifacts: LogArtifactWriter,
    tools: Vec<String>,
    working_dir: Option<PathBuf>,
    aggregator: ViolationAggregator,
}

impl<'a> ForensicRunner<'a> {
    /// Runner with native process execution and a `PATH` probe.
    pub fn new(
        verdict: &'a dyn EnvironmentVerdict,
        test_run: Arc<TestRunConfig>,
        forensics: &ForensicConfig,
    ) -> Self {
        Self {
            verdict,
            probe: EnvironmentProbe::from_env(),
            process_runner: Box::new(NativeRunner::new()),
            test_run,
            policy: TimeoutPolicy::new(forensics.effective_base_timeout_seconds()),
            delay: Duration::from_millis(forensics.effective_delay_ms()),
            artifacts: LogArtifactWriter::new(forensics.effective_log_dir()),
            tools: forensics.tools.clone(),
            working_dir: None,
            aggregator: ViolationAggregator::new(),
        }
    }

    pub fn with_process_runner(mut self, runner: Box<dyn ProcessRunner>) -> Self {
        self.process_runner = runner;
        self
    }

    pub fn with_probe(mut self, probe: EnvironmentProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts = LogArtifactWriter::new(dir);
        self
    }

    /// Also record availability of these tools in the report.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    pub fn log_dir(&self) -> &Path {
        self.artifacts.dir()
    }

    /// Lines dropped by the parser across every batch this runner ran.
    pub fn skipped_total(&self) -> usize {
        self.aggregator.skipped_total()
    }

    /// Run `command` `iterations` times and collect one record per run.
    ///
    /// `Err` is returned only for a bad request or an unusable log
    /// directory, before any iteration starts. A spawn failure stops the
    /// batch and yields a report with `aborted` set.
    pub fn run_sequence(
        &self,
        iterations: u32,
        command: &[String],
    ) -> Result<ForensicReport, RunnerError> {
        if iterations == 0 {
            return Err(RunnerError::InvalidRequest(
                "iteration count must be at least 1".to_string(),
            ));
        }
        let Some((program, args)) = command.split_first() else {
            return Err(RunnerError::InvalidRequest("empty command".to_string()));
        };

        let started_at = Utc::now();
        let environment = self.verdict.environment().clone();
        let tool_availability = self.availability_table(program);
        let spec = self.command_spec(program, args, &tool_availability);
        let command_line = spec.display_line();
        let source_tool = source_tool_name(program);

        self.artifacts.prepare()?;

        tracing::info!(
            command = %command_line,
            iterations,
            base_timeout_seconds = self.policy.base_timeout_seconds(),
            escalated_timeout_seconds = self.policy.escalated_timeout_seconds(),
            log_dir = %self.artifacts.dir().display(),
            "starting forensic sequence"
        );

        let mut records = Vec::with_capacity(iterations as usize);
        let mut previous: Option<IterationState> = None;
        let mut aborted = None;

        for sequence_number in 1..=iterations {
            let record = match self.run_iteration(
                sequence_number,
                previous,
                &spec,
                &command_line,
                &source_tool,
            ) {
                Ok(record) => record,
                Err(err) => {
                    aborted = Some(err.tagged_string());
                    break;
                }
            };
            previous = Some(record.state);
            records.push(record);

            if sequence_number < iterations && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }

        let summary = ViolationSummary::from_records(records.iter().flat_map(|r| &r.violations));
        let report = ForensicReport {
            command: command.to_vec(),
            policy: self.policy,
            environment,
            tool_availability,
            started_at,
            finished_at: Utc::now(),
            records,
            summary,
            aborted,
        };

        tracing::info!(
            completed = report.completed(),
            timed_out = report.timed_out(),
            failed = report.failed(),
            violation_count = report.summary.total(),
            skipped_lines = report.total_skipped_lines(),
            aborted = report.is_aborted(),
            "forensic sequence finished"
        );
        Ok(report)
    }

    fn run_iteration(
        &self,
        sequence_number: u32,
        previous: Option<IterationState>,
        spec: &CommandSpec,
        command_line: &str,
        source_tool: &str,
    ) -> Result<ExecutionRecord, RunnerError> {
        let (timeout, escalation) = self.policy.timeout_for(previous);
        let mut state = IterationState::Pending;
        advance(&mut state, IterationState::Running);

        let started_at = Utc::now();
        let clock = Instant::now();
        let mut error = None;

        let output = match self.process_runner.run(spec, timeout) {
            Ok(output) => output,
            Err(err @ RunnerError::Spawn { .. }) => {
                tracing::error!(
                    iteration = sequence_number,
                    code = err.error_code(),
                    error = %err,
                    "cannot spawn target, aborting remaining iterations"
                );
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    iteration = sequence_number,
                    code = err.error_code(),
                    error = %err,
                    "supervision failed, iteration counted as failed"
                );
                error = Some(err.tagged_string());
                ProcessOutput::default()
            }
        };
        let duration_seconds = clock.elapsed().as_secs_f64();

        let outcome = if output.timed_out {
            IterationState::TimedOut
        } else if output.exit_code == Some(0) && error.is_none() {
            IterationState::Completed
        } else {
            IterationState::Failed
        };
        advance(&mut state, outcome);

        let parsed = self.parse_output(&output, source_tool);

        let header = ArtifactHeader {
            iteration: sequence_number,
            started_at,
            timeout_seconds: timeout.as_secs(),
            command: command_line,
            escalation,
            state,
            duration_seconds,
        };
        let log_artifact_path = match self.artifacts.write(&header, &output) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(
                    iteration = sequence_number,
                    code = err.error_code(),
                    error = %err,
                    "log artifact not written"
                );
                None
            }
        };

        tracing::info!(
            iteration = sequence_number,
            state = %state,
            timeout_seconds = timeout.as_secs(),
            duration_seconds,
            escalation = ?escalation,
            exit_code = ?output.exit_code,
            violation_count = parsed.records.len(),
            skipped_lines = parsed.skipped_lines,
            "iteration finished"
        );

        Ok(ExecutionRecord {
            sequence_number,
            started_at,
            duration_seconds,
            timeout_seconds: timeout.as_secs(),
            escalation,
            state,
            exit_code: output.exit_code,
            signal: output.signal,
            timed_out: output.timed_out,
            violations: parsed.records,
            skipped_lines: parsed.skipped_lines,
            log_artifact_path,
            error,
        })
    }

    fn availability_table(&self, program: &str) -> ToolAvailabilityTable {
        let checker = ToolAvailabilityChecker::new(self.verdict, self.probe.clone());
        let mut names: Vec<&str> = self.tools.iter().map(String::as_str).collect();
        if !names.contains(&program) {
            names.push(program);
        }
        let table = checker.build_table(names);
        for tool in table.unavailable() {
            tracing::warn!(tool, "tool not available");
        }
        table
    }

    fn command_spec(
        &self,
        program: &str,
        args: &[String],
        table: &ToolAvailabilityTable,
    ) -> CommandSpec {
        let resolved = table
            .get(program)
            .filter(|a| a.uses_venv)
            .and_then(|a| a.path.clone());
        let mut spec = match resolved {
            Some(path) => CommandSpec::new(path),
            None => CommandSpec::new(program),
        }
        .args(args)
        .envs(self.test_run.child_env());
        if let Some(dir) = &self.working_dir {
            spec = spec.cwd(dir);
        }
        spec
    }

    fn parse_output(&self, output: &ProcessOutput, source_tool: &str) -> ParseOutcome {
        let mut parsed = self
            .aggregator
            .parse_with_diagnostics(&output.stdout_string(), source_tool);
        let stderr = self
            .aggregator
            .parse_with_diagnostics(&output.stderr_string(), source_tool);
        parsed.records.extend(stderr.records);
        parsed.skipped_lines += stderr.skipped_lines;
        parsed
    }
}

fn advance(state: &mut IterationState, next: IterationState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal iteration transition {state} -> {next}"
    );
    *state = next;
}

/// File name of the program, used as `source_tool` on parsed records.
fn source_tool_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}
