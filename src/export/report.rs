//! CSV import of instrument rows and export of sizing results.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{RawInstrumentRow, SizingResult};

/// UTF-8 byte-order mark, so spreadsheet tools detect the encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Columns required in an instrument import file.
const IMPORT_HEADERS: [&str; 4] = ["symbol", "entry_price", "stop_loss_pct", "leverage"];

/// Export column headers, in order.
pub const EXPORT_HEADERS: [&str; 10] = [
    "symbol",
    "entry_price",
    "stop_loss_pct",
    "stop_loss_point",
    "total_fee",
    "max_loss",
    "position_size",
    "position_value",
    "margin_used",
    "margin_ratio",
];

/// Render sizing results as BOM-prefixed CSV.
pub fn to_bytes(results: &[SizingResult]) -> Result<Vec<u8>> {
    let mut buf = UTF8_BOM.to_vec();
    write_csv(&mut buf, results)?;
    Ok(buf)
}

/// Write sizing results to a CSV file.
pub fn write_results<P: AsRef<Path>>(results: &[SizingResult], path: P) -> Result<()> {
    let mut file = File::create(&path)
        .with_context(|| format!("Failed to create file: {:?}", path.as_ref()))?;

    file.write_all(UTF8_BOM)?;
    write_csv(&mut file, results)?;
    Ok(())
}

fn write_csv<W: Write>(out: W, results: &[SizingResult]) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(EXPORT_HEADERS)?;

    for r in results {
        writer.write_record(export_record(r))?;
    }

    writer.flush()?;
    Ok(())
}

/// One export row, rounded for display.
pub fn export_record(r: &SizingResult) -> [String; 10] {
    [
        r.symbol.clone(),
        r.entry_price.normalize().to_string(),
        percent(r.stop_loss_pct),
        fixed(r.stop_loss_point, 6),
        fixed(r.total_fee, 2),
        fixed(r.risk_amount, 2),
        fixed(r.position_size, 4),
        fixed(r.position_value, 2),
        fixed(r.margin_used, 2),
        ratio_percent(r.margin_ratio),
    ]
}

/// Round half-to-even and pad to exactly `dp` places.
pub fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, value.round_dp(dp))
}

/// Two decimals followed by a percent sign.
pub fn percent(value: Decimal) -> String {
    format!("{}%", fixed(value, 2))
}

/// Format a fraction (0.48) as a percentage ("48.00%").
///
/// Falls back to scientific notation when the percentage does not fit in a
/// decimal.
pub fn ratio_percent(ratio: Decimal) -> String {
    match ratio.checked_mul(Decimal::ONE_HUNDRED) {
        Some(pct) => percent(pct),
        None => format!("{:.2e}%", ratio.to_f64().unwrap_or(f64::NAN) * 100.0),
    }
}

/// Read instrument rows from CSV with a
/// `symbol,entry_price,stop_loss_pct,leverage` header.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<RawInstrumentRow>> {
    let mut file = File::open(&path)
        .with_context(|| format!("Failed to open file: {:?}", path.as_ref()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;

    parse_rows(&contents)
}

/// Parse instrument rows from CSV text. A leading BOM is ignored.
///
/// Ragged rows are kept: missing cells become empty text and surface as
/// per-row parse rejections when the batch is sized.
pub fn parse_rows(contents: &str) -> Result<Vec<RawInstrumentRow>> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let mut columns = [0usize; 4];
    for (slot, name) in columns.iter_mut().zip(IMPORT_HEADERS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Missing column '{}'", name))?;
    }

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Failed to read instrument row {}", line + 1))?;
        if record.len() != headers.len() {
            warn!(
                row = line + 1,
                fields = record.len(),
                expected = headers.len(),
                "Ragged instrument row"
            );
        }

        let cell = |i: usize| record.get(columns[i]).unwrap_or("");
        rows.push(RawInstrumentRow::new(cell(0), cell(1), cell(2), cell(3)));
    }

    Ok(rows)
}
