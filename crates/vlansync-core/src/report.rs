// ── Run report ──
//
// Serializable summary of one reconciliation run, rendered by the CLI as
// a table, JSON or YAML.

use serde::Serialize;

use crate::reconcile::{Mismatch, PortComparison, Reconciliation};
use crate::writeback::{UpdateBudget, WriteResult, WriteStatus};

/// Whether the run was unattended or scoped to one switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunMode {
    Full,
    Targeted { switch: String },
}

impl RunMode {
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Full => None,
            Self::Targeted { switch } => Some(switch),
        }
    }
}

/// How the run ended, short of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunOutcome {
    /// Every switch was compared; nothing left to write.
    Completed,
    /// All mismatches of the target switch were written.
    TargetApplied,
    /// The update budget ran out with mismatches remaining.
    BudgetExhausted,
}

impl RunOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, Self::BudgetExhausted)
    }
}

/// Per-switch section of the report.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchSummary {
    pub source: String,
    pub switch: String,
    pub device_id: u64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub mismatches: Vec<Mismatch>,
    pub writes: Vec<WriteResult>,
}

impl SwitchSummary {
    pub fn new(
        source: impl Into<String>,
        switch: impl Into<String>,
        device_id: u64,
        reconciliation: Reconciliation,
    ) -> Self {
        Self {
            source: source.into(),
            switch: switch.into(),
            device_id,
            matched: reconciliation.matched,
            missing: reconciliation.missing,
            mismatches: reconciliation.mismatches,
            writes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub mode: RunMode,
    pub switches: Vec<SwitchSummary>,
    pub budget_remaining: u32,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn new(mode: RunMode, budget: UpdateBudget) -> Self {
        Self {
            mode,
            switches: Vec::new(),
            budget_remaining: budget.remaining(),
            outcome: RunOutcome::Completed,
        }
    }

    pub(crate) fn finish(mut self, outcome: RunOutcome, budget: UpdateBudget) -> Self {
        self.outcome = outcome;
        self.budget_remaining = budget.remaining();
        self
    }

    pub fn total_mismatches(&self) -> usize {
        self.switches.iter().map(|s| s.mismatches.len()).sum()
    }

    pub fn total_missing(&self) -> usize {
        self.switches.iter().map(|s| s.missing.len()).sum()
    }

    fn writes(&self) -> impl Iterator<Item = &WriteResult> {
        self.switches.iter().flat_map(|s| s.writes.iter())
    }

    pub fn writes_applied(&self) -> usize {
        self.writes().filter(|w| w.was_written()).count()
    }

    pub fn writes_verified(&self) -> usize {
        self.writes()
            .filter(|w| w.status == WriteStatus::Verified)
            .count()
    }

    pub fn verification_failures(&self) -> usize {
        self.writes()
            .filter(|w| matches!(w.status, WriteStatus::VerificationFailed { .. }))
            .count()
    }

    pub fn skipped_unresolvable(&self) -> usize {
        self.writes().filter(|w| !w.was_written()).count()
    }
}

/// Dry-run comparison of a single switch (`check`).
#[derive(Debug, Clone, Serialize)]
pub struct SwitchCheck {
    pub source: String,
    pub switch: String,
    pub device_id: u64,
    pub ports: Vec<PortComparison>,
}
