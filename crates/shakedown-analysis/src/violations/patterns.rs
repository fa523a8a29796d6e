//! Single-line extraction patterns, in priority order.
//!
//! Every pattern captures into the same named groups (`path`, `line`, `col`,
//! `sev`, `rule`, `msg`) so one extractor serves them all. Only `path` and
//! `msg` are mandatory.
//!
//! Priority (first full match wins; the multi-line structured YAML block in
//! `structured_block` is tried before all of these):
//!
//! | # | name | shape | kind |
//! |---|------|-------|------|
//! | 1 | `tsc` | `path(line,col): error TS2322: message` | typescript |
//! | 2 | `eslint-unix` | `path:line:col: message [Error/rule]` | javascript |
//! | 3 | `eslint-compact` | `path: line N, col M, Error - message (rule)` | javascript |
//! | 4 | `yamllint-parsable` | `path:line:col: [warning] message (rule)` | yaml |
//! | 5 | `markdownlint` | `path:line[:col] MD013/alias message` | markdown |
//! | 6 | `script-typed` | `path:line:col: message [rule]` | python |
//! | 7 | `shell` | `path:line: message` | bash |
//! | 8 | `stylesheet` | `path.css - message` | css |
//! | 9 | `markup` | `path - message` | html |
//!
//! The more specific shapes sit above the generic ones they would otherwise
//! be swallowed by (`eslint-unix` and `yamllint-parsable` both also match
//! `script-typed`; `stylesheet` also matches `markup`).
//!
//! Kind follows the shape, not the tool or file extension. Shell linters in
//! gcc format (`deploy.sh:4:6: warning: ... [SC2086]`) carry a column, so they
//! match `script-typed` and come out as python; only the column-less
//! `path:line: message` form is tagged bash.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::types::{LanguageKind, Severity, ViolationRecord};

/// Where a pattern's rule id may hide inside the message when the regex
/// does not capture it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStyle {
    /// Rule is captured by the regex or absent.
    Captured,
    /// `message [rule]` or `RULE123 message`.
    BracketOrLeadingCode,
    /// `message (rule)` or `message [rule]`.
    Trailing,
}

/// Raw definition of a line pattern.
pub struct PatternDef {
    pub name: &'static str,
    pub language: LanguageKind,
    pub regex: &'static str,
    pub rule_style: RuleStyle,
}

pub const PATTERN_DEFS: &[PatternDef] = &[
    PatternDef {
        name: "tsc",
        language: LanguageKind::Typescript,
        regex: r"^(?P<path>[^\s(][^(]*)\((?P<line>\d+),(?P<col>\d+)\):\s*(?P<sev>error|warning|message)\s+(?P<rule>TS\d+):\s*(?P<msg>\S.*)$",
        rule_style: RuleStyle::Captured,
    },
    PatternDef {
        name: "eslint-unix",
        language: LanguageKind::Javascript,
        regex: r"^(?P<path>[^\s:][^:]*):(?P<line>\d+):(?P<col>\d+):\s*(?P<msg>\S.*?)\s*\[(?P<sev>Error|Warning|Info)(?:/(?P<rule>[^\]]+))?\]$",
        rule_style: RuleStyle::Captured,
    },
    PatternDef {
        name: "eslint-compact",
        language: LanguageKind::Javascript,
        regex: r"^(?P<path>[^\s:][^:]*):\s+line (?P<line>\d+), col (?P<col>\d+), (?P<sev>Error|Warning|Info) - (?P<msg>\S.*?)(?:\s+\((?P<rule>[^()\s]+)\))?$",
        rule_style: RuleStyle::Captured,
    },
    PatternDef {
        name: "yamllint-parsable",
        language: LanguageKind::Yaml,
        regex: r"^(?P<path>[^\s:][^:]*):(?P<line>\d+):(?P<col>\d+):\s*\[(?P<sev>error|warning)\]\s*(?P<msg>\S.*?)(?:\s+\((?P<rule>[\w-]+)\))?$",
        rule_style: RuleStyle::Captured,
    },
    PatternDef {
        name: "markdownlint",
        language: LanguageKind::Markdown,
        regex: r"^(?P<path>[^\s:][^:]*):(?P<line>\d+)(?::(?P<col>\d+))?\s+(?:(?P<sev>error|warning)\s+)?(?P<rule>MD\d{3}(?:/[\w-]+)*)\s+(?P<msg>\S.*)$",
        rule_style: RuleStyle::Captured,
    },
    PatternDef {
        name: "script-typed",
        language: LanguageKind::Python,
        regex: r"^(?P<path>[^\s:][^:]*):(?P<line>\d+):(?P<col>\d+):\s*(?P<msg>\S.*)$",
        rule_style: RuleStyle::BracketOrLeadingCode,
    },
    PatternDef {
        name: "shell",
        language: LanguageKind::Bash,
        regex: r"^(?P<path>[^\s:][^:]*):(?P<line>\d+):\s*(?P<msg>\S.*)$",
        rule_style: RuleStyle::BracketOrLeadingCode,
    },
    PatternDef {
        name: "stylesheet",
        language: LanguageKind::Css,
        regex: r"^(?P<path>\S+\.(?:css|scss|sass|less)) - (?P<msg>\S.*)$",
        rule_style: RuleStyle::Trailing,
    },
    PatternDef {
        name: "markup",
        language: LanguageKind::Html,
        regex: r"^(?P<path>\S+\.[A-Za-z0-9]+) - (?P<msg>\S.*)$",
        rule_style: RuleStyle::Trailing,
    },
];

static SEVERITY_PREFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?i)(?P<sev>error|warning|warn|note|info|style)\s*:\s*(?P<rest>\S.*)$").ok()
});

static TRAILING_BRACKET_RULE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?P<rest>.*?)\s*\[(?P<rule>[^\[\]\s]+)\]$").ok());

static TRAILING_PAREN_RULE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?P<rest>.*?)\s*\((?P<rule>[\w./-]+)\)$").ok());

static LEADING_CODE_RULE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?P<rule>[A-Z]{1,4}\d{2,5}):?\s+(?P<rest>\S.*)$").ok());

/// A compiled line pattern.
pub struct LinePattern {
    pub name: &'static str,
    pub language: LanguageKind,
    pub rule_style: RuleStyle,
    regex: Regex,
}

/// Compiled patterns in priority order. A definition that fails to compile
/// is left out; `tests::all_patterns_compile` guards against that.
pub static LINE_PATTERNS: LazyLock<Vec<LinePattern>> = LazyLock::new(|| {
    PATTERN_DEFS
        .iter()
        .filter_map(|def| {
            Regex::new(def.regex).ok().map(|regex| LinePattern {
                name: def.name,
                language: def.language,
                rule_style: def.rule_style,
                regex,
            })
        })
        .collect()
});

impl LinePattern {
    /// Extract a record if this pattern fully matches `line`.
    pub fn extract(&self, line: &str, source_tool: &str) -> Option<ViolationRecord> {
        let caps = self.regex.captures(line)?;
        let file_path = caps.name("path")?.as_str().trim().to_string();
        let raw_message = caps.name("msg")?.as_str().trim();

        let mut severity = caps.name("sev").map(|m| Severity::from_token(m.as_str()));
        let mut rule_id = caps.name("rule").map(|m| m.as_str().to_string());
        let mut message = raw_message.to_string();

        if severity.is_none() {
            if let Some((sev, rest)) = split_severity_prefix(&message) {
                severity = Some(sev);
                message = rest;
            }
        }
        if rule_id.is_none() {
            if let Some((rule, rest)) = split_rule(&message, self.rule_style) {
                rule_id = Some(rule);
                message = rest;
            }
        }

        Some(ViolationRecord {
            file_path,
            line: parse_number(&caps, "line"),
            column: parse_number(&caps, "col"),
            rule_id,
            severity: severity.unwrap_or(Severity::Error),
            message,
            source_tool: source_tool.to_string(),
            language_kind: self.language,
        })
    }
}

/// Try every line pattern in priority order.
pub fn match_line(line: &str, source_tool: &str) -> Option<ViolationRecord> {
    LINE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.extract(line, source_tool))
}

fn parse_number(caps: &Captures<'_>, group: &str) -> Option<u32> {
    caps.name(group).and_then(|m| m.as_str().parse().ok())
}

fn split_severity_prefix(message: &str) -> Option<(Severity, String)> {
    let caps = SEVERITY_PREFIX.as_ref()?.captures(message)?;
    Some((
        Severity::from_token(&caps["sev"]),
        caps["rest"].trim().to_string(),
    ))
}

fn split_rule(message: &str, style: RuleStyle) -> Option<(String, String)> {
    match style {
        RuleStyle::Captured => None,
        RuleStyle::BracketOrLeadingCode => take_rule(&TRAILING_BRACKET_RULE, message)
            .or_else(|| take_rule(&LEADING_CODE_RULE, message)),
        RuleStyle::Trailing => take_rule(&TRAILING_BRACKET_RULE, message)
            .or_else(|| take_rule(&TRAILING_PAREN_RULE, message)),
    }
}

/// Split `message` into `(rule, rest)`; a rule with nothing left over is
/// not a rule.
fn take_rule(re: &Option<Regex>, message: &str) -> Option<(String, String)> {
    let caps = re.as_ref()?.captures(message)?;
    let rest = caps["rest"].trim();
    if rest.is_empty() {
        return None;
    }
    Some((caps["rule"].to_string(), rest.to_string()))
}
