//! Data models for instrument rows, sizing results and expectancy figures.

mod expectancy;
mod instrument;
mod sizing_result;

pub use expectancy::{ExpectancyBand, ExpectancyInput, ExpectancyResult, MONTHS_PER_YEAR};
pub use instrument::{InstrumentRow, RawInstrumentRow};
pub use sizing_result::SizingResult;
