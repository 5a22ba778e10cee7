//! Expectancy inputs, results and classification.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of compounding periods per year.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Parameters of a trading system for expectancy estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectancyInput {
    /// Win rate percentage (0 to 100)
    pub win_rate_pct: Decimal,

    /// Reward multiple per unit risked
    pub rr_ratio: Decimal,

    /// Trades taken per month
    pub trades_per_month: u32,

    /// Starting capital
    pub capital: Decimal,

    /// Percentage of capital risked per trade (0 to 100)
    pub risk_pct: Decimal,
}

/// Expected value and compounded return figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectancyResult {
    /// Capital risked on each trade
    pub risk_amount: Decimal,

    /// Expected result per unit risked (dimensionless)
    pub expected_value: Decimal,

    /// Expected profit per trade in currency
    pub expected_per_trade: Decimal,

    /// Expected profit per month in currency
    pub monthly_profit: Decimal,

    /// Monthly return as a fraction of capital
    pub monthly_return: Decimal,

    /// Monthly-compounded annual return as a fraction
    pub annual_return: Decimal,

    /// Month-end equity for each of the twelve compounding periods
    pub equity_curve: Vec<Decimal>,
}

impl ExpectancyResult {
    pub fn band(&self) -> ExpectancyBand {
        ExpectancyBand::classify(self.expected_value)
    }
}

/// Three mutually exclusive expectancy classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectancyBand {
    Negative,
    Breakeven,
    Positive,
}

impl ExpectancyBand {
    pub fn classify(expected_value: Decimal) -> Self {
        match expected_value.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Less => Self::Negative,
            std::cmp::Ordering::Equal => Self::Breakeven,
            std::cmp::Ordering::Greater => Self::Positive,
        }
    }
}

impl fmt::Display for ExpectancyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "negative expectancy"),
            Self::Breakeven => write!(f, "breakeven"),
            Self::Positive => write!(f, "positive expectancy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_band_classification() {
        assert_eq!(ExpectancyBand::classify(dec!(-0.3334)), ExpectancyBand::Negative);
        assert_eq!(ExpectancyBand::classify(dec!(0)), ExpectancyBand::Breakeven);
        assert_eq!(ExpectancyBand::classify(dec!(-0.0)), ExpectancyBand::Breakeven);
        assert_eq!(ExpectancyBand::classify(dec!(0.8)), ExpectancyBand::Positive);
    }

    #[test]
    fn test_band_messages() {
        assert_eq!(ExpectancyBand::Negative.to_string(), "negative expectancy");
        assert_eq!(ExpectancyBand::Breakeven.to_string(), "breakeven");
        assert_eq!(ExpectancyBand::Positive.to_string(), "positive expectancy");
    }
}
