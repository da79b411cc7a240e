//! Skeleton node types

use crate::data::NodeKind;

/// Handle of a skeleton node (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkelId(pub(crate) u32);

impl SkelId {
    /// The document-level root context
    pub const ROOT: SkelId = SkelId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One distinct name/kind path
#[derive(Debug, Clone)]
pub struct SkelNode {
    /// Tag or attribute name id (0 for unnamed kinds)
    pub name: u32,
    /// Node kind
    pub kind: NodeKind,
    /// Times this path was seen
    pub count: u32,
    /// Accumulated text length of this context
    pub text_len: u64,
    /// Element nesting level (root context = 0)
    pub(crate) level: u32,
    pub(crate) children: Vec<SkelId>,
}

impl SkelNode {
    pub(crate) fn new(name: u32, kind: NodeKind, level: u32) -> Self {
        SkelNode {
            name,
            kind,
            count: 0,
            text_len: 0,
            level,
            children: Vec::new(),
        }
    }

    /// Element nesting level (root context = 0)
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn children(&self) -> &[SkelId] {
        &self.children
    }
}
