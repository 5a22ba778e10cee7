//! Position sizing: configuration, the sizer itself and batch outcomes.

mod batch;
mod config;
mod error;
mod position_sizer;

pub use batch::{BatchOutcome, RowRejection, SizingBatch};
pub use config::SizingConfig;
pub use error::{RowError, SizingError};
pub use position_sizer::PositionSizer;
