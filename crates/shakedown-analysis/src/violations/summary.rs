//! Violation counts by language kind and severity.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{LanguageKind, Severity, ViolationRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Violation counts keyed by language kind. Kinds with no violations are
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViolationSummary {
    by_language: BTreeMap<LanguageKind, SeverityCounts>,
}

impl ViolationSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ViolationRecord>,
    {
        let mut summary = Self::default();
        for record in records {
            summary.add(record);
        }
        summary
    }

    pub fn add(&mut self, record: &ViolationRecord) {
        self.by_language
            .entry(record.language_kind)
            .or_default()
            .bump(record.severity);
    }

    pub fn counts(&self, language: LanguageKind) -> SeverityCounts {
        self.by_language.get(&language).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LanguageKind, &SeverityCounts)> {
        self.by_language.iter().map(|(kind, counts)| (*kind, counts))
    }

    pub fn total(&self) -> usize {
        self.by_language.values().map(SeverityCounts::total).sum()
    }

    pub fn errors(&self) -> usize {
        self.by_language.values().map(|c| c.error).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }
}
