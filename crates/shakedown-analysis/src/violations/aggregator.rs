//! ViolationAggregator — raw multi-tool output to ordered violation records.
//!
//! Parsing policy:
//! - Lines are processed in input order and records come out in that same
//!   order. Nothing is sorted, so a forensic log stays diffable against the
//!   raw tool output.
//! - Each line is offered to the structured YAML block first, then to the
//!   single-line patterns in `patterns::PATTERN_DEFS` order. The first full
//!   match wins.
//! - Lines no pattern matches are dropped. This is intentional lossy
//!   parsing: tools print banners, progress, and summaries around their
//!   findings. Dropped non-blank lines are counted and reported through
//!   [`ParseOutcome::skipped_lines`] and [`ViolationAggregator::skipped_total`]
//!   so format drift in a tool shows up as a rising skip count.
//! - ANSI color sequences are stripped before matching.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use regex::Regex;

use super::patterns::match_line;
use super::structured_block::BlockBuilder;
use super::types::ViolationRecord;

static ANSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").ok());

/// Records extracted from one tool output plus the diagnostic skip count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub records: Vec<ViolationRecord>,
    /// Non-blank lines that matched no pattern.
    pub skipped_lines: usize,
}

/// Stateless parser with a cumulative skip tally for diagnostics.
#[derive(Debug, Default)]
pub struct ViolationAggregator {
    skipped_total: AtomicUsize,
}

impl ViolationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw_output` produced by `source_tool`.
    pub fn parse(&self, raw_output: &str, source_tool: &str) -> Vec<ViolationRecord> {
        self.parse_with_diagnostics(raw_output, source_tool).records
    }

    /// Parse and also return how many lines were dropped.
    pub fn parse_with_diagnostics(&self, raw_output: &str, source_tool: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        let mut block: Option<BlockBuilder> = None;

        for raw_line in raw_output.lines() {
            let line = strip_ansi(raw_line);
            let line = line.trim_end();

            if let Some(open) = block.as_mut() {
                if !line.is_empty() && open.absorb(line) {
                    continue;
                }
                if let Some(finished) = block.take() {
                    close_block(finished, source_tool, &mut outcome);
                }
            }

            if line.trim().is_empty() {
                continue;
            }

            if let Some(opened) = BlockBuilder::open(line) {
                block = Some(opened);
                continue;
            }

            match match_line(line, source_tool) {
                Some(record) => outcome.records.push(record),
                None => outcome.skipped_lines += 1,
            }
        }

        if let Some(finished) = block.take() {
            close_block(finished, source_tool, &mut outcome);
        }

        self.skipped_total
            .fetch_add(outcome.skipped_lines, Ordering::Relaxed);
        tracing::debug!(
            source_tool,
            violation_count = outcome.records.len(),
            skipped_lines = outcome.skipped_lines,
            "parsed tool output"
        );
        outcome
    }

    /// Lines dropped across every parse this aggregator has performed.
    pub fn skipped_total(&self) -> usize {
        self.skipped_total.load(Ordering::Relaxed)
    }
}

fn close_block(block: BlockBuilder, source_tool: &str, outcome: &mut ParseOutcome) {
    let consumed = block.lines_consumed();
    match block.finish(source_tool) {
        Some(record) => outcome.records.push(record),
        None => outcome.skipped_lines += consumed,
    }
}

fn strip_ansi(line: &str) -> Cow<'_, str> {
    match ANSI_ESCAPE.as_ref() {
        Some(re) if line.contains('\x1b') => re.replace_all(line, ""),
        _ => Cow::Borrowed(line),
    }
}
