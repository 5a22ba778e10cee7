//! Output of sizing a single instrument.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Loss-bounded sizing for one instrument.
///
/// All fields derive from the row, the account balance and the fee rate;
/// the struct is never modified after the sizer builds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Instrument identifier
    pub symbol: String,

    /// Entry price in quote currency
    pub entry_price: Decimal,

    /// Stop distance as a percentage of entry
    pub stop_loss_pct: Decimal,

    /// Absolute price distance from entry to stop
    pub stop_loss_point: Decimal,

    /// Loss per unit at the stop: stop distance plus one taker fill at entry price
    pub total_risk_per_unit: Decimal,

    /// Maximum loss allowed for the position (shared by the whole batch)
    pub risk_amount: Decimal,

    /// Units of the instrument to open
    pub position_size: Decimal,

    /// Notional value at entry
    pub position_value: Decimal,

    /// Collateral required at the given leverage
    pub margin_used: Decimal,

    /// Round-trip taker fees (entry + exit)
    pub total_fee: Decimal,

    /// Margin as a fraction of the account balance (0.0 to 1.0)
    pub margin_ratio: Decimal,
}

impl SizingResult {
    /// Loss realized if the stop is hit.
    ///
    /// Equals `risk_amount` up to decimal precision for every sized row.
    pub fn loss_at_stop(&self) -> Decimal {
        self.position_size * self.total_risk_per_unit
    }
}
