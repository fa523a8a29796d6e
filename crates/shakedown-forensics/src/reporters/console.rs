//! Console reporter — human-readable output with color codes.

use std::fmt::Write as _;

use shakedown_analysis::violations::Severity;

use super::Reporter;
use crate::record::{ExitStatus, ForensicReport};
use crate::state::IterationState;

/// Console reporter for human-readable terminal output.
pub struct ConsoleReporter {
    pub use_color: bool,
    /// Print each violation under its iteration, not just the counts.
    pub show_violations: bool,
}

impl ConsoleReporter {
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            show_violations: true,
        }
    }

    fn state_symbol(&self, state: IterationState) -> &'static str {
        match state {
            IterationState::Completed => "✓",
            IterationState::TimedOut => "⏱",
            IterationState::Failed => "✗",
            IterationState::Pending | IterationState::Running => "…",
        }
    }

    fn color_start(&self, severity: Severity) -> &'static str {
        if !self.use_color {
            return "";
        }
        match severity {
            Severity::Error => "\x1b[31m",
            Severity::Warning => "\x1b[33m",
            Severity::Info => "\x1b[36m",
        }
    }

    fn color_end(&self) -> &'static str {
        if self.use_color {
            "\x1b[0m"
        } else {
            ""
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter for ConsoleReporter {
    fn name(&self) -> &'static str {
        "console"
    }

    fn generate(&self, report: &ForensicReport) -> Result<String, String> {
        let mut out = String::new();
        let ce = self.color_end();

        let _ = writeln!(out, "Forensic run: {}", report.command.join(" "));
        let env = &report.environment;
        match env.root_path() {
            Some(root) if env.in_virtual_env() => {
                let _ = writeln!(out, "Environment: isolated ({})", root.display());
            }
            _ => {
                let _ = writeln!(out, "Environment: system");
            }
        }
        for warning in env.warnings() {
            let _ = writeln!(out, "  ⚠ {warning}");
        }
        let _ = writeln!(
            out,
            "Timeouts: base {}s, escalated {}s\n",
            report.policy.base_timeout_seconds(),
            report.policy.escalated_timeout_seconds()
        );

        if !report.tool_availability.is_empty() {
            out.push_str("Tools:\n");
            for (name, availability) in report.tool_availability.iter() {
                let location = match &availability.path {
                    Some(path) => path.display().to_string(),
                    None => "not found".to_string(),
                };
                let venv = if availability.uses_venv { " [venv]" } else { "" };
                let _ = writeln!(out, "  {name}: {location}{venv}");
            }
            out.push('\n');
        }

        for record in &report.records {
            let escalation = record
                .escalation
                .map(|t| format!(", escalated: {t}"))
                .unwrap_or_default();
            let exit = record
                .exit_code
                .map_or_else(|| "-".to_string(), |c| c.to_string());
            let _ = writeln!(
                out,
                "{} #{:03} {} in {:.2}s (timeout {}s{escalation}, exit {exit}) {} violations",
                self.state_symbol(record.state),
                record.sequence_number,
                record.state,
                record.duration_seconds,
                record.timeout_seconds,
                record.violations.len(),
            );
            if self.show_violations {
                for v in &record.violations {
                    let cs = self.color_start(v.severity);
                    let position = match (v.line, v.column) {
                        (Some(line), Some(col)) => format!(":{line}:{col}"),
                        (Some(line), None) => format!(":{line}"),
                        _ => String::new(),
                    };
                    let rule = v
                        .rule_id
                        .as_deref()
                        .map(|r| format!(" [{r}]"))
                        .unwrap_or_default();
                    let _ = writeln!(
                        out,
                        "    {cs}{}{ce}: {}{position}: {}{rule} ({})",
                        v.severity, v.file_path, v.message, v.language_kind
                    );
                }
            }
            if let Some(error) = &record.error {
                let _ = writeln!(out, "    ⚡ {error}");
            }
        }

        if let Some(reason) = &report.aborted {
            let _ = writeln!(
                out,
                "⚡ aborted after {} iteration(s): {reason}",
                report.records.len()
            );
        }

        if !report.summary.is_empty() {
            out.push_str("\nViolations by language:\n");
            for (kind, counts) in report.summary.iter() {
                let _ = writeln!(
                    out,
                    "  {:<11} {} error, {} warning, {} info",
                    kind.as_str(),
                    counts.error,
                    counts.warning,
                    counts.info
                );
            }
        }

        let total = report.records.len();
        let _ = writeln!(
            out,
            "\n─── Summary: {}/{total} completed, {} timed out, {} failed, {} violations ({} errors), {} lines skipped ───",
            report.completed(),
            report.timed_out(),
            report.failed(),
            report.summary.total(),
            report.summary.errors(),
            report.total_skipped_lines(),
        );
        let verdict = match report.exit_status() {
            ExitStatus::Clean => "Result: CLEAN ✓",
            ExitStatus::Violations => "Result: VIOLATIONS ✗",
            ExitStatus::ProcessFailures => "Result: UNSTABLE ✗",
            ExitStatus::HarnessError => "Result: ERROR ⚡",
        };
        out.push_str(verdict);
        out.push('\n');

        Ok(out)
    }
}
