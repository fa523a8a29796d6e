//! Structured YAML block extraction.
//!
//! Some tools emit one violation as a small YAML mapping instead of a line:
//!
//! ```text
//! - file: config/app.yml
//!   line: 3
//!   column: 5
//!   severity: warning
//!   message: wrong indentation
//!   rule: indentation
//! ```
//!
//! A block opens on an unindented `file:`/`path:` line (optionally a list
//! item) and absorbs the indented `key: value` lines that follow. It closes
//! on a blank line, an unindented line, or end of input.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{LanguageKind, Severity, ViolationRecord};

static BLOCK_HEADER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:-\s+)?(?:file|path):\s*(?P<path>\S.*?)\s*$").ok()
});

static BLOCK_FIELD: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s+(?:-\s+)?(?P<key>[A-Za-z_]+):\s*(?P<value>.*?)\s*$").ok()
});

/// A block being accumulated.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    path: String,
    line: Option<u32>,
    column: Option<u32>,
    severity: Option<Severity>,
    message: Option<String>,
    rule: Option<String>,
    lines_consumed: usize,
}

impl BlockBuilder {
    /// Open a block if `line` is a block header.
    pub fn open(line: &str) -> Option<Self> {
        let caps = BLOCK_HEADER.as_ref()?.captures(line)?;
        Some(Self {
            path: unquote(&caps["path"]).to_string(),
            lines_consumed: 1,
            ..Self::default()
        })
    }

    /// Absorb an indented field line. Returns `false` when `line` does not
    /// belong to the block, which closes it.
    pub fn absorb(&mut self, line: &str) -> bool {
        let Some(caps) = BLOCK_FIELD.as_ref().and_then(|re| re.captures(line)) else {
            return false;
        };
        let value = unquote(&caps["value"]);
        match caps["key"].to_ascii_lowercase().as_str() {
            "message" | "msg" => self.message = Some(value.to_string()),
            "rule" | "rule_id" | "code" => self.rule = Some(value.to_string()),
            "line" => self.line = value.parse().ok(),
            "column" | "col" => self.column = value.parse().ok(),
            "severity" | "level" => self.severity = Some(Severity::from_token(value)),
            _ => {}
        }
        self.lines_consumed += 1;
        true
    }

    /// Number of raw lines this block consumed.
    pub fn lines_consumed(&self) -> usize {
        self.lines_consumed
    }

    /// Close the block. A block without a message yields nothing.
    pub fn finish(self, source_tool: &str) -> Option<ViolationRecord> {
        let message = self.message.filter(|m| !m.is_empty())?;
        Some(ViolationRecord {
            file_path: self.path,
            line: self.line,
            column: self.column,
            rule_id: self.rule.filter(|r| !r.is_empty()),
            severity: self.severity.unwrap_or(Severity::Error),
            message,
            source_tool: source_tool.to_string(),
            language_kind: LanguageKind::Yaml,
        })
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_regexes_compile() {
        assert!(BLOCK_HEADER.is_some());
        assert!(BLOCK_FIELD.is_some());
    }

    #[test]
    fn header_requires_unindented_key() {
        assert!(BlockBuilder::open("- file: config/app.yml").is_some());
        assert!(BlockBuilder::open("path: ci.yaml").is_some());
        assert!(BlockBuilder::open("  file: nested.yml").is_none());
        assert!(BlockBuilder::open("profile: dev").is_none());
    }

    #[test]
    fn quoted_values_are_unwrapped() {
        let mut block = BlockBuilder::open("file: \"a b.yml\"").unwrap();
        assert!(block.absorb("  message: 'too many spaces'"));
        let record = block.finish("yamllint").unwrap();
        assert_eq!(record.file_path, "a b.yml");
        assert_eq!(record.message, "too many spaces");
    }

    #[test]
    fn block_without_message_yields_nothing() {
        let mut block = BlockBuilder::open("file: a.yml").unwrap();
        assert!(block.absorb("  rule: truthy"));
        assert_eq!(block.lines_consumed(), 2);
        assert!(block.finish("yamllint").is_none());
    }
}
