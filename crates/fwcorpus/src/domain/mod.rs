//! Corpus entity model: ranges, records, and aggregates.

pub mod errors;
pub mod model;
pub mod range;
