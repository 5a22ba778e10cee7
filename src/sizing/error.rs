//! Error types for position sizing.

use rust_decimal::Decimal;
use thiserror::Error;

/// Why a single instrument row could not be sized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowError {
    /// A numeric cell could not be parsed.
    #[error("invalid {field} '{value}': {detail}")]
    Parse {
        /// Name of the offending field.
        field: &'static str,
        /// Text as supplied.
        value: String,
        /// Parser message.
        detail: String,
    },

    /// Stop distance wider than the configured cap.
    #[error("stop-loss too wide: {stop_loss_pct}% exceeds the {max}% limit")]
    PolicyViolation {
        stop_loss_pct: Decimal,
        max: Decimal,
    },

    /// Inputs that would divide by zero or leave the loss unbounded.
    #[error("degenerate input: {detail}")]
    DegenerateInput {
        detail: String,
    },
}

impl RowError {
    /// Whether this rejection withholds the accepted rows of its batch.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::PolicyViolation { .. })
    }

    pub(crate) fn degenerate(detail: impl Into<String>) -> Self {
        Self::DegenerateInput {
            detail: detail.into(),
        }
    }
}

/// Errors that fail a whole sizing call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SizingError {
    /// Account-level scalar out of range.
    #[error("invalid {field}: {value} (expected {expected})")]
    InvalidInput {
        field: &'static str,
        value: Decimal,
        expected: &'static str,
    },

    /// Sizer configuration out of range.
    #[error("invalid sizing config: {0}")]
    InvalidConfig(String),
}
