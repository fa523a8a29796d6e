//! Core types for the violation model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Map a tool's severity token. Unknown tokens count as errors.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" => Self::Warning,
            "info" | "note" | "message" | "style" | "hint" | "suggestion" => Self::Info,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Language family a violation was attributed to.
///
/// Decided by the extraction pattern that matched, not by file extension:
/// a tool may report on files it does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageKind {
    Python,
    Bash,
    Css,
    Html,
    Javascript,
    Typescript,
    Yaml,
    Markdown,
    Other,
}

impl LanguageKind {
    pub const ALL: [LanguageKind; 9] = [
        Self::Python,
        Self::Bash,
        Self::Css,
        Self::Html,
        Self::Javascript,
        Self::Typescript,
        Self::Yaml,
        Self::Markdown,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Bash => "bash",
            Self::Css => "css",
            Self::Html => "html",
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for LanguageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub file_path: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub rule_id: Option<String>,
    pub severity: Severity,
    pub message: String,
    pub source_tool: String,
    pub language_kind: LanguageKind,
}
