//! JSON reporter — structured JSON output.

use serde_json::{json, Map, Value};
use shakedown_core::tracing::metrics;

use super::Reporter;
use crate::record::ForensicReport;

/// JSON reporter for machine-readable output.
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn generate(&self, report: &ForensicReport) -> Result<String, String> {
        let iterations: Vec<Value> = report
            .records
            .iter()
            .map(|r| {
                let mut entry = Map::new();
                entry.insert(metrics::ITERATION.into(), json!(r.sequence_number));
                entry.insert(metrics::ITERATION_STATE.into(), json!(r.state));
                entry.insert(metrics::TIMEOUT_SECONDS.into(), json!(r.timeout_seconds));
                entry.insert(metrics::DURATION_SECONDS.into(), json!(r.duration_seconds));
                entry.insert("started_at".into(), json!(r.started_at));
                entry.insert("escalation".into(), json!(r.escalation));
                entry.insert("exit_code".into(), json!(r.exit_code));
                entry.insert("signal".into(), json!(r.signal));
                entry.insert("timed_out".into(), json!(r.timed_out));
                entry.insert(metrics::VIOLATION_COUNT.into(), json!(r.violations.len()));
                entry.insert(metrics::SKIPPED_LINES.into(), json!(r.skipped_lines));
                entry.insert("violations".into(), json!(r.violations));
                entry.insert("log_artifact_path".into(), json!(r.log_artifact_path));
                if let Some(error) = &r.error {
                    entry.insert("error".into(), json!(error));
                }
                Value::Object(entry)
            })
            .collect();

        let exit_status = report.exit_status();
        let mut output = json!({
            "command": report.command,
            "exit_status": exit_status,
            "exit_code": exit_status.code(),
            "policy": report.policy,
            "environment": report.environment,
            "tool_availability": report.tool_availability,
            "started_at": report.started_at,
            "finished_at": report.finished_at,
            "completed": report.completed(),
            "timed_out": report.timed_out(),
            "failed": report.failed(),
            "summary": report.summary,
            "iterations": iterations,
        });
        if let Some(reason) = &report.aborted {
            output["aborted"] = json!(reason);
        }

        serde_json::to_string_pretty(&output).map_err(|e| e.to_string())
    }
}
