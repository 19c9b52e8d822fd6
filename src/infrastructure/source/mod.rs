//! Price source adapters

mod http_source;

pub use http_source::{FieldExtractor, FieldRule, HttpPriceSource};
