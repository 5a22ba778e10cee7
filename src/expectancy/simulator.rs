//! Expectancy simulation: expected value per trade and monthly-compounded
//! return from win rate and reward:risk ratio.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ExpectancyInput, ExpectancyResult, MONTHS_PER_YEAR};

/// Errors from expectancy simulation. Nothing partial is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpectancyError {
    /// An input is outside its allowed range.
    #[error("invalid {field}: {value} (expected {expected})")]
    InvalidInput {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A core figure is not representable, independent of the projection.
    #[error("{0} overflowed")]
    Overflow(&'static str),
}

/// Estimates expected return for a trading system.
pub struct ExpectancySimulator;

impl ExpectancySimulator {
    /// Run the simulation.
    ///
    /// EV = p * rr - (1 - p), with p = win_rate / 100, measured in units of
    /// the amount risked per trade. Returns compound over twelve monthly
    /// periods.
    pub fn simulate(input: &ExpectancyInput) -> Result<ExpectancyResult, ExpectancyError> {
        Self::validate(input)?;

        let hundred = Decimal::ONE_HUNDRED;
        let win_prob = input.win_rate_pct / hundred;
        let loss_prob = Decimal::ONE - win_prob;

        let risk_amount = mul(input.capital, input.risk_pct, "risk_amount")? / hundred;
        let expected_value = mul(win_prob, input.rr_ratio, "expected_value")? - loss_prob;
        let expected_per_trade = mul(expected_value, risk_amount, "expected_per_trade")?;
        let monthly_profit = mul(
            expected_per_trade,
            Decimal::from(input.trades_per_month),
            "monthly_profit",
        )?;
        let monthly_return = monthly_profit
            .checked_div(input.capital)
            .ok_or(ExpectancyError::Overflow("monthly_return"))?;

        if monthly_return < -Decimal::ONE {
            warn!(
                monthly_return = %monthly_return,
                "Expected monthly loss exceeds capital; compounded figures are not meaningful"
            );
        }

        let growth = Decimal::ONE
            .checked_add(monthly_return)
            .ok_or(ExpectancyError::Overflow("annual_return"))?;
        let mut factor = Decimal::ONE;
        for _ in 0..MONTHS_PER_YEAR {
            factor = mul(factor, growth, "annual_return")?;
        }
        let annual_return = factor - Decimal::ONE;
        let equity_curve = Self::equity_curve(input.capital, growth);

        debug!(
            expected_value = %expected_value,
            monthly_return = %monthly_return,
            annual_return = %annual_return,
            "Simulated expectancy"
        );

        Ok(ExpectancyResult {
            risk_amount,
            expected_value,
            expected_per_trade,
            monthly_profit,
            monthly_return,
            annual_return,
            equity_curve,
        })
    }

    /// Month-end equity under monthly compounding.
    ///
    /// Stops at the first month whose equity is not representable, so the
    /// curve may hold fewer than twelve points for extreme inputs.
    fn equity_curve(capital: Decimal, growth: Decimal) -> Vec<Decimal> {
        let mut curve = Vec::with_capacity(MONTHS_PER_YEAR as usize);
        let mut equity = capital;
        for month in 1..=MONTHS_PER_YEAR {
            match equity.checked_mul(growth) {
                Some(next) => {
                    equity = next;
                    curve.push(equity);
                }
                None => {
                    warn!(month, "Equity projection left the representable range");
                    break;
                }
            }
        }
        curve
    }

    fn validate(input: &ExpectancyInput) -> Result<(), ExpectancyError> {
        let hundred = Decimal::ONE_HUNDRED;

        if input.win_rate_pct < Decimal::ZERO || input.win_rate_pct > hundred {
            return Err(invalid("win_rate_pct", input.win_rate_pct, "in [0, 100]"));
        }
        if input.rr_ratio <= Decimal::ZERO {
            return Err(invalid("rr_ratio", input.rr_ratio, "> 0"));
        }
        if input.trades_per_month == 0 {
            return Err(invalid("trades_per_month", input.trades_per_month, ">= 1"));
        }
        if input.capital <= Decimal::ZERO {
            return Err(invalid("capital", input.capital, "> 0"));
        }
        if input.risk_pct <= Decimal::ZERO || input.risk_pct > hundred {
            return Err(invalid("risk_pct", input.risk_pct, "in (0, 100]"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> ExpectancyError {
    ExpectancyError::InvalidInput {
        field,
        value: value.to_string(),
        expected,
    }
}

fn mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, ExpectancyError> {
    a.checked_mul(b).ok_or(ExpectancyError::Overflow(what))
}
