//! History export as JSON or CSV

use anyhow::{Context, Result};

use crate::shared::types::{HistoryRecord, DEFAULT_PRICE_FIELD, TIMESTAMP_FIELD};

pub const CSV_FILENAME: &str = "gold_price_data.csv";

pub fn to_json(records: &[HistoryRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// CSV with one column per price field (sorted by name) followed by `timestamp`.
///
/// The header follows the first record's shape; an empty history exports as
/// `price,timestamp`.
pub fn to_csv(records: &[HistoryRecord]) -> Result<String> {
    let fields: Vec<String> = records
        .first()
        .map(|r| r.reading.field_names())
        .unwrap_or_else(|| vec![DEFAULT_PRICE_FIELD.to_string()]);

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = fields.iter().map(String::as_str).collect();
    header.push(TIMESTAMP_FIELD);
    writer.write_record(&header).context("write CSV header")?;

    for record in records {
        let mut row: Vec<String> = fields
            .iter()
            .map(|f| record.reading.get(f).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        row.push(record.timestamp());
        writer.write_record(&row).context("write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV is not UTF-8")
}
