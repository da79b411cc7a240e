//! Wildcard Module - Full-text wildcard patterns
//!
//! Query syntax, evaluated over code points:
//!
//! ```text
//! .        any one character          [1,1]
//! .?       optional character         [0,1]
//! .*       any run                    [0,∞]
//! .+       non-empty run              [1,∞]
//! .{m,n}   bounded run                [m,n]
//! \c       literal c (including '.')
//! c        literal c
//! ```
//!
//! Compiled patterns are immutable and can be shared across threads.

pub mod cache;
mod matcher;
pub mod parallel;
mod parse;

pub use cache::PatternCache;
pub use parallel::{filter_matches, match_all, match_queries};

use crate::error::CompileError;

/// Maximum repetition of `.*` and `.+`
pub const UNBOUNDED: usize = usize::MAX;

/// One compiled pattern element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    /// Exactly this code point
    Literal(char),
    /// Between `min` and `max` arbitrary code points
    Any { min: usize, max: usize },
}

impl Atom {
    /// Longest input this atom can consume
    #[inline]
    pub fn max_len(self) -> usize {
        match self {
            Atom::Literal(_) => 1,
            Atom::Any { max, .. } => max,
        }
    }
}

/// Compiled wildcard query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    query: String,
    atoms: Vec<Atom>,
    /// Token length range still matchable from each atom on
    bounds: Vec<(usize, usize)>,
    simple: bool,
}

impl Wildcard {
    /// Compile a query.
    pub fn parse(query: &str) -> Result<Self, CompileError> {
        let atoms = parse::parse(query)?;
        let bounds = matcher::suffix_bounds(&atoms);
        Ok(Wildcard {
            query: query.to_owned(),
            atoms,
            bounds,
            simple: is_simple(query.as_bytes()),
        })
    }

    /// The source query
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[inline]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// True if the query has no wildcard syntax and matching reduces to
    /// comparing with [`query`](Self::query).
    #[inline]
    pub fn is_simple(&self) -> bool {
        self.simple
    }
}

/// Check whether a raw query contains neither `.` nor `\`.
#[inline]
pub fn is_simple(query: &[u8]) -> bool {
    memchr::memchr2(b'.', b'\\', query).is_none()
}
