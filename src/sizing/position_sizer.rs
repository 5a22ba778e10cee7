//! Loss-bounded position sizing: size each position so a stop-out costs a
//! fixed fraction of the account.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{RowError, RowRejection, SizingBatch, SizingConfig, SizingError};
use crate::models::{InstrumentRow, RawInstrumentRow, SizingResult};

/// Calculator for loss-bounded position sizes.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    /// Create a new position sizer with given config.
    pub fn new(config: SizingConfig) -> Result<Self, SizingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Fee and stop-loss constants this sizer applies.
    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Size a batch of rows as typed by the user.
    ///
    /// # Arguments
    /// * `account_balance` - Account capital in quote currency (> 0)
    /// * `risk_percent` - Percentage of capital to lose at the stop (0, 100]
    /// * `rows` - Instrument rows with textual cells
    ///
    /// # Returns
    /// Accepted and rejected rows, each in input order. Only out-of-range
    /// account parameters fail the call.
    pub fn size(
        &self,
        account_balance: Decimal,
        risk_percent: Decimal,
        rows: &[RawInstrumentRow],
    ) -> Result<SizingBatch, SizingError> {
        let risk_amount = Self::risk_amount(account_balance, risk_percent)?;
        let mut batch = SizingBatch {
            risk_amount,
            accepted: Vec::with_capacity(rows.len()),
            rejected: Vec::new(),
        };

        for (row_index, raw) in rows.iter().enumerate() {
            let sized = InstrumentRow::parse(raw)
                .and_then(|row| self.size_row(&row, account_balance, risk_amount));
            Self::collect(&mut batch, row_index, raw.symbol.trim(), sized);
        }

        Ok(batch)
    }

    /// Loss budget for every position: `balance * risk% / 100`.
    pub fn risk_amount(account_balance: Decimal, risk_percent: Decimal) -> Result<Decimal, SizingError> {
        if account_balance <= Decimal::ZERO {
            return Err(SizingError::InvalidInput {
                field: "account_balance",
                value: account_balance,
                expected: "> 0",
            });
        }
        if risk_percent <= Decimal::ZERO || risk_percent > Decimal::ONE_HUNDRED {
            return Err(SizingError::InvalidInput {
                field: "risk_percent",
                value: risk_percent,
                expected: "in (0, 100]",
            });
        }

        account_balance
            .checked_mul(risk_percent)
            .map(|v| v / Decimal::ONE_HUNDRED)
            .ok_or(SizingError::InvalidInput {
                field: "account_balance",
                value: account_balance,
                expected: "a representable amount",
            })
    }

    /// Size a single row.
    ///
    /// position_size = risk_amount / (stop distance + entry taker fee per unit)
    ///
    /// so hitting the stop loses exactly `risk_amount` whatever the entry
    /// price or leverage.
    pub fn size_row(
        &self,
        row: &InstrumentRow,
        account_balance: Decimal,
        risk_amount: Decimal,
    ) -> Result<SizingResult, RowError> {
        let fee_rate = self.config.fee_rate;

        if row.stop_loss_pct > self.config.max_stop_loss_pct {
            return Err(RowError::PolicyViolation {
                stop_loss_pct: row.stop_loss_pct,
                max: self.config.max_stop_loss_pct,
            });
        }
        if row.entry_price <= Decimal::ZERO {
            return Err(RowError::degenerate(format!(
                "entry_price must be > 0, got {}",
                row.entry_price
            )));
        }
        if row.stop_loss_pct < Decimal::ZERO {
            return Err(RowError::degenerate(format!(
                "stop_loss_pct must be >= 0, got {}",
                row.stop_loss_pct
            )));
        }
        if row.leverage <= Decimal::ZERO {
            return Err(RowError::degenerate(format!(
                "leverage must be > 0, got {}",
                row.leverage
            )));
        }

        let stop_loss_point =
            checked(row.entry_price.checked_mul(row.stop_loss_pct), "stop_loss_point")?
                / Decimal::ONE_HUNDRED;
        let entry_fee = checked(row.entry_price.checked_mul(fee_rate), "entry fee")?;
        let total_risk_per_unit = checked(stop_loss_point.checked_add(entry_fee), "total_risk_per_unit")?;

        if total_risk_per_unit <= Decimal::ZERO {
            return Err(RowError::degenerate(format!(
                "risk per unit is {} (stop distance and fee are both zero)",
                total_risk_per_unit
            )));
        }

        let position_size = checked(risk_amount.checked_div(total_risk_per_unit), "position_size")?;
        let position_value = checked(position_size.checked_mul(row.entry_price), "position_value")?;
        let margin_used = checked(position_value.checked_div(row.leverage), "margin_used")?;
        let total_fee = checked(
            position_value.checked_mul(self.config.round_trip_fee_rate()),
            "total_fee",
        )?;
        let margin_ratio = checked(margin_used.checked_div(account_balance), "margin_ratio")?;

        debug!(
            symbol = %row.symbol,
            position_size = %position_size,
            margin_used = %margin_used,
            "Sized position"
        );

        Ok(SizingResult {
            symbol: row.symbol.clone(),
            entry_price: row.entry_price,
            stop_loss_pct: row.stop_loss_pct,
            stop_loss_point,
            total_risk_per_unit,
            risk_amount,
            position_size,
            position_value,
            margin_used,
            total_fee,
            margin_ratio,
        })
    }

    fn collect(
        batch: &mut SizingBatch,
        row_index: usize,
        symbol: &str,
        sized: Result<SizingResult, RowError>,
    ) {
        match sized {
            Ok(result) => batch.accepted.push(result),
            Err(error) => {
                warn!(row = row_index, symbol = %symbol, error = %error, "Row rejected");
                batch.rejected.push(RowRejection {
                    row_index,
                    symbol: symbol.to_string(),
                    error,
                });
            }
        }
    }
}

/// Map a failed checked operation to a degenerate-input rejection.
fn checked(value: Option<Decimal>, what: &str) -> Result<Decimal, RowError> {
    value.ok_or_else(|| RowError::degenerate(format!("{} is not representable", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::BatchOutcome;
    use rust_decimal_macros::dec;

    fn sizer() -> PositionSizer {
        PositionSizer::new(SizingConfig::default()).unwrap()
    }

    fn row(symbol: &str, entry: &str, stop: &str, leverage: &str) -> RawInstrumentRow {
        RawInstrumentRow::new(symbol, entry, stop, leverage)
    }

    fn parsed(symbol: &str, entry: &str, stop: &str, leverage: &str) -> InstrumentRow {
        InstrumentRow::parse(&row(symbol, entry, stop, leverage)).unwrap()
    }

    fn parsed_leverage(raw: &RawInstrumentRow) -> Decimal {
        InstrumentRow::parse(raw).unwrap().leverage
    }

    fn assert_close(a: Decimal, b: Decimal) {
        assert!((a - b).abs() < dec!(0.0000000001), "{a} != {b}");
    }

    #[test]
    fn test_btc_scenario() {
        let batch = sizer()
            .size(dec!(10000), dec!(3), &[row("BTC", "65000", "0.5", "20")])
            .unwrap();

        assert_eq!(batch.risk_amount, dec!(300));
        assert!(batch.rejected.is_empty());

        let r = &batch.accepted[0];
        assert_eq!(r.stop_loss_point, dec!(325));
        assert_eq!(r.total_risk_per_unit, dec!(357.5));
        assert_eq!(r.position_size.round_dp(4), dec!(0.8392));
        assert_eq!(r.position_value.round_dp(2), dec!(54545.45));
        assert_eq!(r.margin_used.round_dp(2), dec!(2727.27));
        assert_eq!(r.total_fee.round_dp(2), dec!(54.55));
        assert_eq!((r.margin_ratio * dec!(100)).round_dp(2), dec!(27.27));
    }

    #[test]
    fn test_loss_at_stop_equals_risk_amount() {
        let rows = vec![
            row("BTC", "65000", "0.5", "20"),
            row("ETH", "3500", "0.6", "10"),
            row("DOGE", "0.1234", "0.75", "3"),
            row("SOL", "150.25", "0", "1"),
        ];
        let batch = sizer().size(dec!(2500), dec!(1.5), &rows).unwrap();

        assert_eq!(batch.accepted.len(), 4);
        for r in &batch.accepted {
            assert_close(r.loss_at_stop(), batch.risk_amount);
            assert_close(
                r.position_size * (r.stop_loss_point + r.entry_price * dec!(0.0005)),
                r.risk_amount,
            );
        }
    }

    #[test]
    fn test_margin_derivations() {
        let rows = vec![
            row("BTC", "65000", "0.5", "20"),
            row("ETH", "3500", "0.6", "10"),
        ];
        let batch = sizer().size(dec!(10000), dec!(3), &rows).unwrap();

        for (r, input) in batch.accepted.iter().zip(&rows) {
            assert_eq!(r.margin_used, r.position_value / parsed_leverage(input));
            assert_eq!(r.margin_ratio, r.margin_used / dec!(10000));
            assert_eq!(r.total_fee, r.position_value * dec!(0.0005) * dec!(2));
        }
    }

    #[test]
    fn test_idempotent() {
        let rows = RawInstrumentRow::defaults();
        let s = sizer();

        let first = s.size(dec!(10000), dec!(3), &rows).unwrap();
        let second = s.size(dec!(10000), dec!(3), &rows).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stop_loss_cap_boundary() {
        let s = sizer();

        let at_cap = s
            .size(dec!(10000), dec!(3), &[row("BTC", "65000", "0.75", "20")])
            .unwrap();
        assert_eq!(at_cap.accepted.len(), 1);

        let over_cap = s
            .size(dec!(10000), dec!(3), &[row("BTC", "65000", "0.7500001", "20")])
            .unwrap();
        assert!(over_cap.accepted.is_empty());
        assert!(matches!(
            over_cap.rejected[0].error,
            RowError::PolicyViolation { .. }
        ));
    }

    #[test]
    fn test_wide_stop_blocks_batch() {
        let rows = vec![
            row("BTC", "65000", "0.5", "20"),
            row("ETH", "3500", "0.8", "10"),
        ];
        let batch = sizer().size(dec!(10000), dec!(3), &rows).unwrap();

        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(
            batch.rejected[0].error,
            RowError::PolicyViolation {
                stop_loss_pct: dec!(0.8),
                max: dec!(0.75),
            }
        );
        assert_eq!(
            batch.outcome(),
            BatchOutcome::Blocked {
                violations: vec!["ETH"]
            }
        );
    }

    #[test]
    fn test_parse_error_does_not_block() {
        let rows = vec![
            RawInstrumentRow::new("BTC", "65000", "0.5", "20"),
            RawInstrumentRow::new("ETH", "n/a", "0.6", "10"),
        ];
        let batch = sizer().size(dec!(10000), dec!(3), &rows).unwrap();

        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].row_index, 1);
        assert_eq!(batch.rejected[0].symbol, "ETH");
        assert!(matches!(batch.rejected[0].error, RowError::Parse { field: "entry_price", .. }));

        match batch.outcome() {
            BatchOutcome::Ready(results) => {
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].symbol, "BTC");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_zero_stop_zero_fee_is_degenerate() {
        let free = PositionSizer::new(SizingConfig {
            fee_rate: Decimal::ZERO,
            ..Default::default()
        })
        .unwrap();

        let batch = free
            .size(dec!(10000), dec!(3), &[row("BTC", "65000", "0", "20")])
            .unwrap();

        assert!(batch.accepted.is_empty());
        assert!(matches!(batch.rejected[0].error, RowError::DegenerateInput { .. }));
        assert!(!batch.rejected[0].error.is_blocking());
        assert_eq!(batch.outcome(), BatchOutcome::Empty);
    }

    #[test]
    fn test_zero_leverage_is_degenerate() {
        let err = sizer()
            .size_row(&parsed("BTC", "65000", "0.5", "0"), dec!(10000), dec!(300))
            .unwrap_err();
        assert!(matches!(err, RowError::DegenerateInput { .. }));

        let err = sizer()
            .size_row(&parsed("BTC", "0", "0.5", "20"), dec!(10000), dec!(300))
            .unwrap_err();
        assert!(matches!(err, RowError::DegenerateInput { .. }));
    }

    #[test]
    fn test_order_preserved() {
        let rows = vec![
            RawInstrumentRow::new("A", "100", "0.5", "2"),
            RawInstrumentRow::new("B", "x", "0.5", "2"),
            RawInstrumentRow::new("C", "200", "0.5", "2"),
            RawInstrumentRow::new("D", "300", "0.5", "0"),
            RawInstrumentRow::new("E", "400", "0.5", "2"),
        ];
        let batch = sizer().size(dec!(1000), dec!(1), &rows).unwrap();

        let accepted: Vec<_> = batch.accepted.iter().map(|r| r.symbol.as_str()).collect();
        let rejected: Vec<_> = batch.rejected.iter().map(|r| r.row_index).collect();
        assert_eq!(accepted, vec!["A", "C", "E"]);
        assert_eq!(rejected, vec![1, 3]);
        assert_eq!(batch.warnings().count(), 2);
    }

    #[test]
    fn test_invalid_account_input() {
        let s = sizer();
        let rows = RawInstrumentRow::defaults();

        assert!(matches!(
            s.size(dec!(0), dec!(3), &rows),
            Err(SizingError::InvalidInput { field: "account_balance", .. })
        ));
        assert!(matches!(
            s.size(dec!(10000), dec!(0), &rows),
            Err(SizingError::InvalidInput { field: "risk_percent", .. })
        ));
        assert!(s.size(dec!(10000), dec!(100.5), &rows).is_err());
        assert!(s.size(dec!(10000), dec!(100), &rows).is_ok());
    }

    #[test]
    fn test_empty_batch() {
        let batch = sizer().size(dec!(10000), dec!(3), &[]).unwrap();
        assert_eq!(batch.outcome(), BatchOutcome::Empty);
    }
}
