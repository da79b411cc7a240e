//! Statistics Module
//!
//! Rebuilds name statistics, the path summary and the document height in
//! one pass over a pre-order document. The open-ancestor stack is
//! reconstructed from parent positions alone:
//!
//! ```text
//! pre:    0     1     2     3     4
//! node:   root  @id   item  text  item
//! parent: -     0     0     2     0
//! stack:  [0]   [0]   [0,2] [0,2] [0,4]   (2 popped since 2 > parent 0)
//! ```

pub mod rebuild;

pub use rebuild::{rebuild, RebuildReport, RebuildState, StatsRebuilder};
