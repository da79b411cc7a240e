//! Data Module - Pre-order document encoding
//!
//! A document is flattened into parallel arrays addressed by pre-order
//! position (`pre`). Every position carries a node kind and the position
//! of its parent; elements and attributes carry a name id from the tag or
//! attribute dictionary, and text-like nodes carry their raw content.
//!
//! ```text
//! pre  kind  parent  name   value
//!  0   elem  -       root
//!  1   attr  0       id     "7"
//!  2   elem  0       item
//!  3   text  2              "hello"
//! ```
//!
//! The statistics rebuild only needs read access to this encoding plus
//! write access to the dictionaries, the meta record and the stored path
//! summary; [`StatsData`] is that boundary.

pub mod image;
pub mod mem;
pub mod meta;
pub mod name_stats;
pub mod names;

pub use image::StatsImage;
pub use mem::{MemData, MemDataBuilder, RawNode};
pub use meta::MetaData;
pub use name_stats::{NameStats, ValueKind};
pub use names::Names;

use crate::skel::Skeleton;

/// Sentinel parent position for top-level nodes
pub const NO_NODE: u32 = u32::MAX;

/// Type of a stored node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document node
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// Attribute
    Attribute,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

impl NodeKind {
    /// Storage code of this kind
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            NodeKind::Document => 0,
            NodeKind::Element => 1,
            NodeKind::Text => 2,
            NodeKind::Attribute => 3,
            NodeKind::Comment => 4,
            NodeKind::ProcessingInstruction => 5,
        }
    }

    /// Kind for a storage code
    #[inline]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NodeKind::Document),
            1 => Some(NodeKind::Element),
            2 => Some(NodeKind::Text),
            3 => Some(NodeKind::Attribute),
            4 => Some(NodeKind::Comment),
            5 => Some(NodeKind::ProcessingInstruction),
            _ => None,
        }
    }

    /// Whether nodes of this kind reference a name dictionary
    #[inline]
    pub fn is_named(self) -> bool {
        matches!(self, NodeKind::Element | NodeKind::Attribute)
    }
}

/// Read access to a pre-order document and write access to its statistics.
///
/// Positions passed to the per-node accessors are always `< size()`.
pub trait StatsData {
    /// Number of positions
    fn size(&self) -> u32;

    /// Kind of the node at `pre`
    fn kind(&self, pre: u32) -> NodeKind;

    /// Parent position, or None for top-level nodes
    fn parent(&self, pre: u32) -> Option<u32>;

    /// Name id of an element or attribute (0 for other kinds)
    fn name_id(&self, pre: u32) -> u32;

    /// Text, attribute value, comment, PI content or document name
    fn value(&self, pre: u32) -> &[u8];

    /// Element name dictionary
    fn tags(&self) -> &Names;
    fn tags_mut(&mut self) -> &mut Names;

    /// Attribute name dictionary
    fn atts(&self) -> &Names;
    fn atts_mut(&mut self) -> &mut Names;

    fn meta(&self) -> &MetaData;
    fn meta_mut(&mut self) -> &mut MetaData;

    /// Replace the stored path summary
    fn install_summary(&mut self, skeleton: Skeleton);

    /// Persist rebuilt statistics
    fn flush(&mut self) -> std::io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        for code in 0..6u8 {
            let kind = NodeKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(NodeKind::from_code(6), None);
    }

    #[test]
    fn test_named_kinds() {
        assert!(NodeKind::Element.is_named());
        assert!(NodeKind::Attribute.is_named());
        assert!(!NodeKind::Text.is_named());
        assert!(!NodeKind::Document.is_named());
    }
}
