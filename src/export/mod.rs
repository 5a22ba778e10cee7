//! Delimited-text import and export.

mod report;

pub use report::{fixed, percent, ratio_percent, read_rows, to_bytes, write_results};
