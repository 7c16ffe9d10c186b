//! Run statistics
//!
//! One [`SourceStats`] per attempted source, folded into [`RunStatistics`]
//! for the final report.

use crate::services::asset_scanner::ScanSummary;
use crate::services::metadata_extractor::SkipReason;
use std::collections::BTreeMap;

/// Outcome of one source pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceStats {
    pub source_index: usize,
    pub name: String,
    /// Fetch attempts used (0 if the scratch area could not be prepared)
    pub acquire_attempts: u32,
    /// Set when the source was abandoned
    pub abandoned: Option<String>,
    pub scan: Option<ScanSummary>,
    /// Candidates considered after the per-source limit
    pub candidates: usize,
    pub accepted: usize,
    /// Skipped candidates per reason label
    pub skipped: BTreeMap<&'static str, usize>,
}

impl SourceStats {
    pub fn new(source_index: usize, name: impl Into<String>) -> Self {
        Self {
            source_index,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn record_skip(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.label()).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn display_string(&self) -> String {
        if let Some(reason) = &self.abandoned {
            return format!("{}: abandoned ({})", self.name, reason);
        }

        let mut line = format!(
            "{}: {} accepted of {} candidates",
            self.name, self.accepted, self.candidates
        );
        if !self.skipped.is_empty() {
            let parts: Vec<String> = self
                .skipped
                .iter()
                .map(|(label, count)| format!("{} {}", count, label))
                .collect();
            line.push_str(&format!(", skipped: {}", parts.join(", ")));
        }
        line
    }
}

/// Whole-run statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Records carried over from a checkpoint
    pub resumed_records: usize,
    /// First source index processed by this invocation
    pub resumed_from: usize,
    pub sources: Vec<SourceStats>,
}

impl RunStatistics {
    pub fn add_source(&mut self, stats: SourceStats) {
        self.sources.push(stats);
    }

    pub fn accepted(&self) -> usize {
        self.sources.iter().map(|s| s.accepted).sum()
    }

    pub fn abandoned_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.abandoned.is_some())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Skips per reason across all sources
    pub fn skipped_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut totals = BTreeMap::new();
        for source in &self.sources {
            for (label, count) in &source.skipped {
                *totals.entry(*label).or_insert(0) += count;
            }
        }
        totals
    }

    pub fn display_string(&self) -> String {
        let abandoned = self.abandoned_sources();
        let mut line = format!(
            "{} sources attempted, {} abandoned, {} new records",
            self.sources.len(),
            abandoned.len(),
            self.accepted()
        );
        if self.resumed_records > 0 || self.resumed_from > 0 {
            line.push_str(&format!(
                " ({} resumed from checkpoint, starting at source {})",
                self.resumed_records, self.resumed_from
            ));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedder::EmbeddingError;

    #[test]
    fn test_source_display() {
        let mut stats = SourceStats::new(0, "a/b");
        stats.candidates = 3;
        stats.accepted = 2;
        stats.record_skip(&SkipReason::Embedding(EmbeddingError::ZeroNorm));

        assert_eq!(
            stats.display_string(),
            "a/b: 2 accepted of 3 candidates, skipped: 1 embedding"
        );
        assert_eq!(stats.skipped_total(), 1);
    }

    #[test]
    fn test_abandoned_display() {
        let mut stats = SourceStats::new(1, "c/d");
        stats.abandoned = Some("gave up".into());
        assert_eq!(stats.display_string(), "c/d: abandoned (gave up)");
    }

    #[test]
    fn test_run_totals() {
        let mut run = RunStatistics::default();

        let mut first = SourceStats::new(0, "a/b");
        first.accepted = 2;
        first.record_skip(&SkipReason::Duplicate { distance: 1 });
        run.add_source(first);

        let mut second = SourceStats::new(1, "c/d");
        second.abandoned = Some("permanent".into());
        run.add_source(second);

        let mut third = SourceStats::new(2, "e/f");
        third.accepted = 1;
        third.record_skip(&SkipReason::Duplicate { distance: 0 });
        run.add_source(third);

        assert_eq!(run.accepted(), 3);
        assert_eq!(run.abandoned_sources(), vec!["c/d"]);
        assert_eq!(run.skipped_by_reason().get("duplicate"), Some(&2));
        assert_eq!(
            run.display_string(),
            "3 sources attempted, 1 abandoned, 3 new records"
        );
    }
}
