//! Instrument rows as supplied by the input table, raw and validated.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sizing::RowError;

/// One row of the instrument table, exactly as the user typed it.
///
/// Every field stays textual so that a malformed cell surfaces as a
/// per-row rejection instead of failing the whole import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInstrumentRow {
    /// Instrument identifier (e.g., "BTC")
    pub symbol: String,

    /// Entry price in quote currency
    pub entry_price: String,

    /// Stop distance as a percentage of entry (e.g., "0.5" = 0.5%)
    pub stop_loss_pct: String,

    /// Leverage multiplier
    pub leverage: String,
}

impl RawInstrumentRow {
    pub fn new(symbol: &str, entry_price: &str, stop_loss_pct: &str, leverage: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            entry_price: entry_price.to_string(),
            stop_loss_pct: stop_loss_pct.to_string(),
            leverage: leverage.to_string(),
        }
    }

    /// The sample table shown when no rows are given.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("BTC", "65000.0", "0.5", "20"),
            Self::new("ETH", "3500.0", "0.6", "10"),
        ]
    }
}

/// Parses the command-line form `SYMBOL:ENTRY:STOP_PCT:LEVERAGE`.
impl FromStr for RawInstrumentRow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [symbol, entry, stop, leverage] if !symbol.is_empty() => {
                Ok(Self::new(symbol, entry, stop, leverage))
            }
            _ => Err(format!(
                "expected SYMBOL:ENTRY:STOP_PCT:LEVERAGE, got '{}'",
                s
            )),
        }
    }
}

/// A row whose numeric fields parsed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRow {
    pub symbol: String,
    pub entry_price: Decimal,
    pub stop_loss_pct: Decimal,
    pub leverage: Decimal,
}

impl InstrumentRow {
    /// Convert the textual cells of a raw row into numbers.
    pub fn parse(raw: &RawInstrumentRow) -> Result<Self, RowError> {
        Ok(Self {
            symbol: raw.symbol.trim().to_string(),
            entry_price: parse_decimal("entry_price", &raw.entry_price)?,
            stop_loss_pct: parse_decimal("stop_loss_pct", &raw.stop_loss_pct)?,
            leverage: parse_decimal("leverage", &raw.leverage)?,
        })
    }
}

/// Accepts plain (`65000.0`) and scientific (`6.5e4`) notation.
fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, RowError> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| RowError::Parse {
            field,
            value: value.to_string(),
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_row() {
        let raw = RawInstrumentRow::new(" BTC ", "65000.0", " 0.5", "20");
        let row = InstrumentRow::parse(&raw).unwrap();

        assert_eq!(row.symbol, "BTC");
        assert_eq!(row.entry_price, dec!(65000));
        assert_eq!(row.stop_loss_pct, dec!(0.5));
        assert_eq!(row.leverage, dec!(20));
    }

    #[test]
    fn test_parse_scientific() {
        let raw = RawInstrumentRow::new("BTC", "6.5e4", "5e-1", "20");
        let row = InstrumentRow::parse(&raw).unwrap();

        assert_eq!(row.entry_price, dec!(65000));
        assert_eq!(row.stop_loss_pct, dec!(0.5));
    }

    #[test]
    fn test_parse_failure_names_field() {
        let raw = RawInstrumentRow::new("ETH", "3500", "abc", "10");
        let err = InstrumentRow::parse(&raw).unwrap_err();

        match err {
            RowError::Parse { field, value, .. } => {
                assert_eq!(field, "stop_loss_pct");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cli_form() {
        let raw: RawInstrumentRow = "SOL:150:0.4:5".parse().unwrap();
        assert_eq!(raw, RawInstrumentRow::new("SOL", "150", "0.4", "5"));

        assert!("SOL:150:0.4".parse::<RawInstrumentRow>().is_err());
        assert!(":150:0.4:5".parse::<RawInstrumentRow>().is_err());
    }
}
