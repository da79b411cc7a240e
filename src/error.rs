//! Error types
//!
//! Wildcard compilation errors are recoverable: the caller treats the query
//! as "no pattern". Statistics errors abort the rebuild pass.

use thiserror::Error;

/// Malformed wildcard query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("trailing backslash with nothing to escape")]
    DanglingEscape,

    #[error("unterminated quantifier starting at position {pos}")]
    UnterminatedQuantifier { pos: usize },

    #[error("unexpected {found:?} in quantifier at position {pos}")]
    InvalidQuantifier { pos: usize, found: char },

    #[error("quantifier minimum {min} exceeds maximum {max}")]
    ReversedBounds { min: usize, max: usize },

    #[error("quantifier bound at position {pos} is too large")]
    BoundOverflow { pos: usize },
}

/// The identifier space of a hash table is exhausted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("hash table cannot grow beyond {entries} entries")]
pub struct CapacityError {
    pub entries: usize,
}

/// Failure of a statistics rebuild or of reading persisted statistics.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("optimization error: {0}")]
    Flush(String),

    #[error("malformed document at pre {pre} (parent {parent:?}): {reason}")]
    Malformed {
        pre: u32,
        parent: Option<u32>,
        reason: &'static str,
    },

    #[error("decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_converts() {
        let err: StatsError = CapacityError { entries: 8 }.into();
        assert!(matches!(err, StatsError::Capacity(_)));
        assert_eq!(err.to_string(), "hash table cannot grow beyond 8 entries");
    }

    #[test]
    fn test_flush_message() {
        let err = StatsError::Flush("disk full".into());
        assert_eq!(err.to_string(), "optimization error: disk full");
    }
}
