//! Common types used across the application

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::shared::errors::PriceError;

/// Field name used by sources that report a single price
pub const DEFAULT_PRICE_FIELD: &str = "price";

/// Column that carries the capture time in history exports; not a valid field name
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// One fetched price snapshot.
///
/// Holds one or more named, non-negative decimal fields. The set of names is
/// the reading's *shape*; two readings are only comparable when their shapes
/// match. Fields are kept sorted by name so iteration order is stable for
/// rendering and CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PriceReading {
    fields: BTreeMap<String, Decimal>,
}

impl PriceReading {
    /// Build a reading from `(name, value)` pairs
    pub fn new<I, K>(fields: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in fields {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(PriceError::InvalidReading("empty field name".to_string()));
            }
            if name == TIMESTAMP_FIELD {
                return Err(PriceError::InvalidReading(format!(
                    "field name {} is reserved",
                    TIMESTAMP_FIELD
                )));
            }
            if value.is_sign_negative() && !value.is_zero() {
                return Err(PriceError::InvalidReading(format!(
                    "field {} is negative: {}",
                    name, value
                )));
            }
            if map.insert(name.clone(), value).is_some() {
                return Err(PriceError::InvalidReading(format!("duplicate field {}", name)));
            }
        }

        if map.is_empty() {
            return Err(PriceError::InvalidReading("reading has no fields".to_string()));
        }

        Ok(Self { fields: map })
    }

    /// Reading with a single `price` field
    pub fn single(value: Decimal) -> Result<Self, PriceError> {
        Self::new([(DEFAULT_PRICE_FIELD, value)])
    }

    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.fields.get(name).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Decimal)> + '_ {
        self.fields.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn same_shape(&self, other: &PriceReading) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.keys().zip(other.fields.keys()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for PriceReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.fields {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

/// A reading plus the wall-clock time it was captured, in the reporting timezone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub reading: PriceReading,
    pub captured_at: DateTime<FixedOffset>,
}

impl HistoryRecord {
    pub fn new(reading: PriceReading, captured_at: DateTime<FixedOffset>) -> Self {
        Self { reading, captured_at }
    }

    pub fn timestamp(&self) -> String {
        self.captured_at.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

// Export shape: `{ <field>: decimal, ..., "timestamp": string }`
impl Serialize for HistoryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.reading.len() + 1))?;
        for (name, value) in self.reading.fields() {
            map.serialize_entry(name, &value)?;
        }
        map.serialize_entry(TIMESTAMP_FIELD, &self.timestamp())?;
        map.end()
    }
}
