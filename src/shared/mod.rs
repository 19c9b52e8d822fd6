//! Price reading types, error enums and formatting helpers used across layers

pub mod errors;
pub mod types;
pub mod utils;
