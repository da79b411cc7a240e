//! In-memory pre-order document
//!
//! Stores the encoding as parallel vectors, with all text-like content in
//! one shared buffer addressed by `(start, end)` spans. Built either event
//! by event through [`MemDataBuilder`] or from an already flattened node
//! list via [`MemData::from_nodes`].

use super::image::StatsImage;
use super::meta::MetaData;
use super::names::Names;
use super::{NodeKind, StatsData, NO_NODE};
use crate::config::StatsConfig;
use crate::error::{CapacityError, Result, StatsError};
use crate::skel::Skeleton;

/// One node of an already flattened document
#[derive(Debug, Clone, Copy)]
pub struct RawNode<'a> {
    pub kind: NodeKind,
    pub parent: Option<u32>,
    /// Element or attribute name (ignored for other kinds)
    pub name: &'a [u8],
    /// Text, attribute value, comment, PI content or document name
    pub value: &'a [u8],
}

/// Pre-order document held in memory
#[derive(Debug)]
pub struct MemData {
    kinds: Vec<NodeKind>,
    /// Parent position per node (NO_NODE for top-level nodes)
    parents: Vec<u32>,
    /// Name id per node (0 for unnamed kinds)
    names: Vec<u32>,
    /// Content span per node
    values: Vec<(usize, usize)>,
    /// Shared content buffer
    content: Vec<u8>,
    tags: Names,
    atts: Names,
    meta: MetaData,
    skeleton: Skeleton,
    /// Last flushed statistics image
    image: Vec<u8>,
}

impl MemData {
    /// Create an empty document
    pub fn new(config: &StatsConfig) -> Self {
        MemData {
            kinds: Vec::new(),
            parents: Vec::new(),
            names: Vec::new(),
            values: Vec::new(),
            content: Vec::new(),
            tags: Names::new(config),
            atts: Names::new(config),
            meta: MetaData::default(),
            skeleton: Skeleton::new(),
            image: Vec::new(),
        }
    }

    /// Build from a flattened node list.
    ///
    /// Each parent must precede its child; the ancestor stack discipline is
    /// left to the statistics rebuild to check.
    pub fn from_nodes<'a, I>(nodes: I, config: &StatsConfig) -> Result<Self>
    where
        I: IntoIterator<Item = RawNode<'a>>,
    {
        let mut data = MemData::new(config);
        for node in nodes {
            let pre = data.kinds.len() as u32;
            if let Some(parent) = node.parent {
                if parent >= pre {
                    return Err(StatsError::Malformed {
                        pre,
                        parent: Some(parent),
                        reason: "parent does not precede node",
                    });
                }
            }
            let name = match node.kind {
                NodeKind::Element => data.tags.intern(node.name)?,
                NodeKind::Attribute => data.atts.intern(node.name)?,
                _ => 0,
            };
            data.push(node.kind, node.parent, name, node.value)?;
        }
        data.meta.dirty = true;
        Ok(data)
    }

    fn push(&mut self, kind: NodeKind, parent: Option<u32>, name: u32, value: &[u8]) -> Result<u32> {
        let pre = self.kinds.len();
        if pre >= NO_NODE as usize {
            return Err(CapacityError { entries: pre }.into());
        }
        let start = self.content.len();
        self.content.extend_from_slice(value);

        self.kinds.push(kind);
        self.parents.push(parent.unwrap_or(NO_NODE));
        self.names.push(name);
        self.values.push((start, self.content.len()));
        self.meta.size = self.kinds.len() as u32;
        Ok(pre as u32)
    }

    /// Stored path summary
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Last flushed statistics image (empty before the first flush)
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Decode the last flushed statistics image.
    pub fn load_image(&self) -> Result<StatsImage> {
        StatsImage::decode(&self.image)
    }
}

impl StatsData for MemData {
    fn size(&self) -> u32 {
        self.kinds.len() as u32
    }

    fn kind(&self, pre: u32) -> NodeKind {
        self.kinds[pre as usize]
    }

    fn parent(&self, pre: u32) -> Option<u32> {
        match self.parents[pre as usize] {
            NO_NODE => None,
            p => Some(p),
        }
    }

    fn name_id(&self, pre: u32) -> u32 {
        self.names[pre as usize]
    }

    fn value(&self, pre: u32) -> &[u8] {
        let (start, end) = self.values[pre as usize];
        &self.content[start..end]
    }

    fn tags(&self) -> &Names {
        &self.tags
    }

    fn tags_mut(&mut self) -> &mut Names {
        &mut self.tags
    }

    fn atts(&self) -> &Names {
        &self.atts
    }

    fn atts_mut(&mut self) -> &mut Names {
        &mut self.atts
    }

    fn meta(&self) -> &MetaData {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut MetaData {
        &mut self.meta
    }

    fn install_summary(&mut self, skeleton: Skeleton) {
        self.skeleton = skeleton;
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.image = StatsImage::encode(&self.meta, &self.tags, &self.atts, &self.skeleton);
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Encodes document events into a [`MemData`]
///
/// Nodes are numbered in the order they are added; `close` ends the
/// innermost open element or document.
pub struct MemDataBuilder {
    data: MemData,
    /// Positions of open elements and documents
    open: Vec<u32>,
}

impl MemDataBuilder {
    pub fn new(config: &StatsConfig) -> Self {
        MemDataBuilder {
            data: MemData::new(config),
            open: Vec::with_capacity(32),
        }
    }

    #[inline]
    fn current_parent(&self) -> Option<u32> {
        self.open.last().copied()
    }

    /// Open a document node; documents only start at the top level.
    pub fn open_document(&mut self, name: &[u8]) -> Result<u32> {
        if !self.open.is_empty() {
            return Err(StatsError::Malformed {
                pre: self.data.size(),
                parent: self.current_parent(),
                reason: "document inside an open node",
            });
        }
        let pre = self.data.push(NodeKind::Document, None, 0, name)?;
        self.open.push(pre);
        Ok(pre)
    }

    /// Open an element; following nodes become its children until `close`
    pub fn open_element(&mut self, name: &[u8]) -> Result<u32> {
        let id = self.data.tags.intern(name)?;
        let pre = self.data.push(NodeKind::Element, self.current_parent(), id, b"")?;
        self.open.push(pre);
        Ok(pre)
    }

    /// Add an attribute to the innermost open element
    pub fn attribute(&mut self, name: &[u8], value: &[u8]) -> Result<u32> {
        let id = self.data.atts.intern(name)?;
        self.data.push(NodeKind::Attribute, self.current_parent(), id, value)
    }

    pub fn text(&mut self, value: &[u8]) -> Result<u32> {
        self.data.push(NodeKind::Text, self.current_parent(), 0, value)
    }

    pub fn comment(&mut self, value: &[u8]) -> Result<u32> {
        self.data.push(NodeKind::Comment, self.current_parent(), 0, value)
    }

    pub fn processing_instruction(&mut self, value: &[u8]) -> Result<u32> {
        self.data
            .push(NodeKind::ProcessingInstruction, self.current_parent(), 0, value)
    }

    /// Close the innermost open node; returns its position
    pub fn close(&mut self) -> Option<u32> {
        self.open.pop()
    }

    /// Number of currently open nodes
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Close everything and return the document
    pub fn finish(mut self) -> MemData {
        self.open.clear();
        self.data.meta.dirty = true;
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_encoding() {
        let mut b = MemDataBuilder::new(&StatsConfig::default());
        let root = b.open_element(b"root").unwrap();
        let attr = b.attribute(b"id", b"7").unwrap();
        let item = b.open_element(b"item").unwrap();
        let text = b.text(b"hello").unwrap();
        b.close();
        let tail = b.comment(b"note").unwrap();
        b.close();
        let data = b.finish();

        assert_eq!((root, attr, item, text, tail), (0, 1, 2, 3, 4));
        assert_eq!(data.size(), 5);
        assert_eq!(data.meta().size, 5);
        assert!(data.meta().dirty);

        assert_eq!(data.parent(root), None);
        assert_eq!(data.parent(attr), Some(0));
        assert_eq!(data.parent(text), Some(2));
        assert_eq!(data.parent(tail), Some(0));

        assert_eq!(data.kind(attr), NodeKind::Attribute);
        assert_eq!(data.tags().key(data.name_id(item)), Some(b"item" as &[u8]));
        assert_eq!(data.atts().key(data.name_id(attr)), Some(b"id" as &[u8]));
        assert_eq!(data.value(attr), b"7");
        assert_eq!(data.value(text), b"hello");
        assert_eq!(data.value(root), b"");
    }

    #[test]
    fn test_document_only_at_top_level() {
        let mut b = MemDataBuilder::new(&StatsConfig::default());
        let doc = b.open_document(b"a.xml").unwrap();
        let root = b.open_element(b"root").unwrap();

        let err = b.open_document(b"b.xml").unwrap_err();
        assert!(matches!(
            err,
            StatsError::Malformed { pre: 2, parent: Some(1), .. }
        ));
        assert_eq!(b.depth(), 2);

        b.close();
        assert!(b.open_document(b"b.xml").is_err());
        b.close();
        let next = b.open_document(b"b.xml").unwrap();
        let data = b.finish();

        assert_eq!((doc, root, next), (0, 1, 2));
        assert_eq!(data.size(), 3);
        assert_eq!(data.parent(next), None);
    }

    #[test]
    fn test_from_nodes() {
        let nodes = [
            RawNode { kind: NodeKind::Element, parent: None, name: b"a", value: b"" },
            RawNode { kind: NodeKind::Text, parent: Some(0), name: b"", value: b"xy" },
        ];
        let data = MemData::from_nodes(nodes, &StatsConfig::default()).unwrap();
        assert_eq!(data.size(), 2);
        assert_eq!(data.tags().len(), 1);
        assert_eq!(data.value(1), b"xy");
    }

    #[test]
    fn test_from_nodes_rejects_forward_parent() {
        let nodes = [
            RawNode { kind: NodeKind::Element, parent: None, name: b"a", value: b"" },
            RawNode { kind: NodeKind::Text, parent: Some(1), name: b"", value: b"x" },
        ];
        let err = MemData::from_nodes(nodes, &StatsConfig::default()).unwrap_err();
        assert!(matches!(err, StatsError::Malformed { pre: 1, .. }));
    }

    #[test]
    fn test_flush_writes_image() {
        let mut b = MemDataBuilder::new(&StatsConfig::default());
        b.open_element(b"root").unwrap();
        let mut data = b.finish();
        assert!(data.image().is_empty());
        data.flush().unwrap();
        let image = data.load_image().unwrap();
        assert_eq!(image.meta.size, 1);
        assert_eq!(image.tags.len(), 1);
    }
}
