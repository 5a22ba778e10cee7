//! Per-batch sizing outcome: accepted rows, rejected rows, presentation gate.

use rust_decimal::Decimal;

use super::RowError;
use crate::models::SizingResult;

/// A row that could not be sized, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// Zero-based index into the submitted rows
    pub row_index: usize,
    pub symbol: String,
    pub error: RowError,
}

impl RowRejection {
    /// Symbol plus the offending stop for policy violations, e.g. "ETH (stop-loss 0.8%)".
    pub fn label(&self) -> String {
        match &self.error {
            RowError::PolicyViolation { stop_loss_pct, .. } => {
                format!("{} (stop-loss {}%)", self.symbol, stop_loss_pct.normalize())
            }
            _ => self.symbol.clone(),
        }
    }
}

/// Result of sizing a batch of rows against one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizingBatch {
    /// Loss budget applied to every row
    pub risk_amount: Decimal,

    /// Sized rows, in input order
    pub accepted: Vec<SizingResult>,

    /// Rejected rows, in input order
    pub rejected: Vec<RowRejection>,
}

/// What the caller may present for a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome<'a> {
    /// At least one row broke the stop-loss cap; nothing is presented.
    Blocked { violations: Vec<&'a str> },
    /// No row could be sized.
    Empty,
    /// Results are ready to show and export.
    Ready(&'a [SizingResult]),
}

impl SizingBatch {
    pub fn policy_violations(&self) -> impl Iterator<Item = &RowRejection> {
        self.rejected.iter().filter(|r| r.error.is_blocking())
    }

    /// Rejections that only warrant a warning.
    pub fn warnings(&self) -> impl Iterator<Item = &RowRejection> {
        self.rejected.iter().filter(|r| !r.error.is_blocking())
    }

    /// Decide what may be presented.
    ///
    /// A policy violation anywhere withholds every accepted row, while
    /// parse and degenerate failures only drop their own row.
    pub fn outcome(&self) -> BatchOutcome<'_> {
        let violations: Vec<&str> = self
            .policy_violations()
            .map(|r| r.symbol.as_str())
            .collect();

        if !violations.is_empty() {
            BatchOutcome::Blocked { violations }
        } else if self.accepted.is_empty() {
            BatchOutcome::Empty
        } else {
            BatchOutcome::Ready(&self.accepted)
        }
    }
}
