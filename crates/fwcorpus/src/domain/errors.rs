//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("inverted section bounds: start {start} exceeds end {end}")]
    InvertedBounds { start: u64, end: u64 },
    #[error("expected a range of the form START..END, got '{input}'")]
    UnparsableRange { input: String },
}
