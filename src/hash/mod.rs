//! Hash Set Module
//!
//! Memory-saving hash sets built from two parallel integer arrays instead
//! of a general-purpose map:
//!
//! ```text
//! buckets: [u32; capacity]   # bucket -> first id in chain (0 = empty)
//! next:    [u32; capacity]   # id -> next id in same bucket (0 = end)
//! ```
//!
//! Entries are addressed by dense 1-based ids; id 0 is the sentinel and
//! never holds data. Growing the table doubles both arrays and re-chains
//! every id without relabeling it, so ids stay stable for the lifetime of
//! the set.

pub mod index;
pub mod token_set;

pub use index::HashIndex;
pub use token_set::{token_hash, TokenSet};
