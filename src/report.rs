//! Result accounting and streaming progress.
//!
//! The [`Reporter`] owns the [`RunSummary`] and forwards every event to a
//! [`ReportFormat`], which decides how it looks on screen.

use std::io;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::compare::Outcome;

/// Whether skipped cases make the run fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Missing fixtures are reported but do not fail the run.
    #[default]
    Warn,
    /// Any skipped case fails the run.
    Fail,
}

/// Outcome of one case, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Aggregate counts for a run. Execution errors count as failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub records: Vec<CaseRecord>,
}

impl RunSummary {
    fn add(&mut self, record: CaseRecord) {
        match record.outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Fail { .. } | Outcome::ExecutionError { .. } => self.failed += 1,
            Outcome::Skip { .. } => self.skipped += 1,
        }
        self.records.push(record);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn is_success(&self, policy: SkipPolicy) -> bool {
        match policy {
            SkipPolicy::Warn => self.failed == 0,
            SkipPolicy::Fail => self.failed == 0 && self.skipped == 0,
        }
    }

    pub fn failed_names(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    Outcome::Fail { .. } | Outcome::ExecutionError { .. }
                )
            })
            .map(|r| r.name.as_str())
    }
}

/// Rendering of run events.
pub trait ReportFormat {
    fn start(&mut self, total: usize) -> io::Result<()>;
    fn case(&mut self, record: &CaseRecord) -> io::Result<()>;
    fn summary(&mut self, summary: &RunSummary, policy: SkipPolicy) -> io::Result<()>;
}

/// Accumulates case outcomes and streams them to a format as they arrive.
pub struct Reporter {
    format: Box<dyn ReportFormat>,
    policy: SkipPolicy,
    summary: RunSummary,
}

impl Reporter {
    pub fn new(format: Box<dyn ReportFormat>, policy: SkipPolicy) -> Self {
        Self {
            format,
            policy,
            summary: RunSummary::default(),
        }
    }

    pub fn start(&mut self, total: usize) {
        if let Err(e) = self.format.start(total) {
            tracing::warn!("failed to write report header: {e}");
        }
    }

    pub fn record(&mut self, name: impl Into<String>, outcome: Outcome) {
        let record = CaseRecord {
            name: name.into(),
            outcome,
        };
        if let Err(e) = self.format.case(&record) {
            tracing::warn!("failed to write case report: {e}");
        }
        self.summary.add(record);
    }

    /// Writes the final tally and hands back the summary.
    pub fn finish(mut self) -> RunSummary {
        if let Err(e) = self.format.summary(&self.summary, self.policy) {
            tracing::warn!("failed to write summary: {e}");
        }
        self.summary
    }
}
