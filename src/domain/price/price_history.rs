//! Append-only history of observed readings

use crate::shared::types::HistoryRecord;

/// Ordered, in-memory sequence of captured readings.
///
/// Records are never mutated or removed and there is no cap; the buffer grows
/// for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct PriceHistory {
    records: Vec<HistoryRecord>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: HistoryRecord) {
        self.records.push(record);
    }

    pub fn all(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::PriceReading;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_append_keeps_order() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let mut history = PriceHistory::new();
        assert!(history.is_empty());

        for (i, price) in [dec!(100), dec!(105), dec!(98)].into_iter().enumerate() {
            let at = tz.with_ymd_and_hms(2026, 1, 1, 0, i as u32, 0).unwrap();
            history.append(HistoryRecord::new(PriceReading::single(price).unwrap(), at));
        }

        let prices: Vec<_> = history
            .all()
            .iter()
            .map(|r| r.reading.get("price").unwrap())
            .collect();
        assert_eq!(prices, vec![dec!(100), dec!(105), dec!(98)]);
        assert_eq!(history.len(), 3);
    }
}
