//! Path Summary Module
//!
//! The skeleton mirrors every distinct name/kind path of a document once:
//!
//! ```text
//! document            <- root context (never counted)
//! └── root (elem) x1
//!     ├── @id (attr) x1
//!     └── item (elem) x120, text 5400 bytes
//! ```
//!
//! Nodes live in an arena addressed by [`SkelId`]. Children of a node are
//! unique per `(name, kind)` and kept in first-seen order; a plain vector
//! is scanned linearly since fan-out per context is small.

pub mod node;
pub mod tree;

pub use node::{SkelId, SkelNode};
pub use tree::Skeleton;
