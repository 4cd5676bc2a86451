//! Half-open byte ranges describing firmware sections.

use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// Half-open interval `[start, end)` over byte offsets.
///
/// Equality is on both endpoints; a range doubles as the uniqueness key of a
/// section within its firmware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundedRange {
    start: u64,
    end: u64,
}

impl BoundedRange {
    /// Construct a range, rejecting inverted bounds.
    pub fn new(start: u64, end: u64) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvertedBounds { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// First byte offset past the range. The `end` byte belongs to the next
    /// section, not this one.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for BoundedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl FromStr for BoundedRange {
    type Err = DomainError;

    /// Parse the `START..END` form used by the interactive shell.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unparsable = || DomainError::UnparsableRange {
            input: value.to_string(),
        };
        let (start, end) = value.split_once("..").ok_or_else(unparsable)?;
        let start = start.trim().parse::<u64>().map_err(|_| unparsable())?;
        let end = end.trim().parse::<u64>().map_err(|_| unparsable())?;
        Self::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_end_minus_start() {
        let range = BoundedRange::new(10, 25).unwrap();
        assert_eq!(range.len(), 15);
        assert!(!range.is_empty());
    }

    #[test]
    fn zero_length_range_is_empty() {
        let range = BoundedRange::new(5, 5).unwrap();
        assert_eq!(range.len(), 0);
        assert!(range.is_empty());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert_eq!(
            BoundedRange::new(9, 3),
            Err(DomainError::InvertedBounds { start: 9, end: 3 })
        );
    }

    #[test]
    fn default_is_zero_zero() {
        assert_eq!(BoundedRange::default(), BoundedRange::new(0, 0).unwrap());
    }

    #[test]
    fn parses_shell_notation() {
        let range: BoundedRange = "0..100".parse().unwrap();
        assert_eq!((range.start(), range.end()), (0, 100));
        assert!("100".parse::<BoundedRange>().is_err());
        assert!("a..b".parse::<BoundedRange>().is_err());
        assert!("9..3".parse::<BoundedRange>().is_err());
    }

    #[test]
    fn displays_half_open_notation() {
        let range = BoundedRange::new(0, 100).unwrap();
        assert_eq!(range.to_string(), "[0, 100)");
    }
}
