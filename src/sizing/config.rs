//! Sizing configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::SizingError;

/// Exchange and policy constants used by the position sizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Taker fee per fill as a fraction of notional (0.0005 = 0.05%)
    pub fee_rate: Decimal,

    /// Widest stop distance allowed, in percent of entry
    pub max_stop_loss_pct: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.0005),         // 0.05% taker
            max_stop_loss_pct: dec!(0.75),  // Hard cap on stop distance
        }
    }
}

impl SizingConfig {
    /// Reject a negative fee rate or a non-positive stop-loss cap.
    pub fn validate(&self) -> Result<(), SizingError> {
        if self.fee_rate < Decimal::ZERO {
            return Err(SizingError::InvalidConfig(format!(
                "fee_rate must be >= 0, got {}",
                self.fee_rate
            )));
        }
        if self.max_stop_loss_pct <= Decimal::ZERO {
            return Err(SizingError::InvalidConfig(format!(
                "max_stop_loss_pct must be > 0, got {}",
                self.max_stop_loss_pct
            )));
        }
        Ok(())
    }

    /// Fee paid on a full round trip, as a fraction of notional.
    pub fn round_trip_fee_rate(&self) -> Decimal {
        self.fee_rate * dec!(2)
    }
}
