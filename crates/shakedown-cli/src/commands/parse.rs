//! `shakedown parse` — normalize captured tool output.

use std::io::Read;

use anyhow::{Context, Result};
use serde_json::json;
use shakedown_analysis::violations::{ViolationAggregator, ViolationSummary};
use shakedown_forensics::ExitStatus;

use super::Session;
use crate::cli::{OutputFormat, ParseArgs};

pub fn execute(session: &Session, args: ParseArgs) -> Result<ExitStatus> {
    let raw = match args.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read stdin")?;
            buf
        }
    };

    let outcome = ViolationAggregator::new().parse_with_diagnostics(&raw, &args.tool);
    let summary = ViolationSummary::from_records(&outcome.records);

    match session.format {
        OutputFormat::Json => {
            let value = json!({
                "source_tool": args.tool,
                "violations": outcome.records,
                "skipped_lines": outcome.skipped_lines,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Console => {
            for v in &outcome.records {
                let position = match (v.line, v.column) {
                    (Some(line), Some(col)) => format!(":{line}:{col}"),
                    (Some(line), None) => format!(":{line}"),
                    _ => String::new(),
                };
                let rule = v.rule_id.as_deref().unwrap_or("-");
                println!(
                    "{}{position}: {} [{rule}] {} ({})",
                    v.file_path, v.severity, v.message, v.language_kind
                );
            }
            println!(
                "{} violations ({} errors), {} lines skipped",
                summary.total(),
                summary.errors(),
                outcome.skipped_lines
            );
        }
    }

    Ok(if summary.errors() > 0 {
        ExitStatus::Violations
    } else {
        ExitStatus::Clean
    })
}
