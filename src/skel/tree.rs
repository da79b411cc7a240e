//! Skeleton - path summary tree
//!
//! Built from scratch on every statistics pass and persisted afterwards.
//! The persisted layout is one record per node, children following their
//! parent in order:
//!
//! ```text
//! num name | u8 kind | num count | num children | num text_len | children...
//! ```

use super::node::{SkelId, SkelNode};
use crate::codec::{write_num, ByteReader};
use crate::data::{Names, NodeKind};
use crate::error::{Result, StatsError};

/// Path summary tree
#[derive(Debug, Clone)]
pub struct Skeleton {
    /// Arena of nodes; index 0 is the root context
    nodes: Vec<SkelNode>,
    /// Deepest element level seen
    max_depth: u32,
}

impl Skeleton {
    /// Create a summary containing only the root context
    pub fn new() -> Self {
        Skeleton {
            nodes: vec![SkelNode::new(0, NodeKind::Document, 0)],
            max_depth: 0,
        }
    }

    /// The root context
    #[inline]
    pub fn root(&self) -> SkelId {
        SkelId::ROOT
    }

    /// Find or create the child of `parent` for `(name, kind)` and count
    /// one occurrence of it.
    ///
    /// `parent` must have been returned by this skeleton.
    pub fn enter(&mut self, parent: SkelId, name: u32, kind: NodeKind) -> SkelId {
        let existing = self.nodes[parent.index()]
            .children
            .iter()
            .copied()
            .find(|c| {
                let n = &self.nodes[c.index()];
                n.name == name && n.kind == kind
            });

        let id = match existing {
            Some(id) => id,
            None => {
                let parent_level = self.nodes[parent.index()].level;
                let level = if kind == NodeKind::Element {
                    parent_level + 1
                } else {
                    parent_level
                };
                let id = SkelId(self.nodes.len() as u32);
                self.nodes.push(SkelNode::new(name, kind, level));
                self.nodes[parent.index()].children.push(id);
                if kind == NodeKind::Element && level > self.max_depth {
                    self.max_depth = level;
                }
                id
            }
        };

        self.nodes[id.index()].count += 1;
        id
    }

    /// Add `len` bytes of text to the statistics of `context`.
    #[inline]
    pub fn add_text(&mut self, context: SkelId, len: u64) {
        self.nodes[context.index()].text_len += len;
    }

    #[inline]
    pub fn get(&self, id: SkelId) -> Option<&SkelNode> {
        self.nodes.get(id.index())
    }

    /// Children of `id` in first-seen order
    pub fn children(&self, id: SkelId) -> &[SkelId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Number of summary nodes, not counting the root context
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Deepest element nesting in the summary
    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// All summary nodes in pre-order, root context excluded
    pub fn descendants(&self) -> Vec<SkelId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<SkelId> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }
        out
    }

    /// Readable token for a node: `name`, `@name`, `text()`, ...
    pub fn label(&self, id: SkelId, tags: &Names, atts: &Names) -> Vec<u8> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        match node.kind {
            NodeKind::Element => tags.key(node.name).unwrap_or(b"?").to_vec(),
            NodeKind::Attribute => {
                let mut label = b"@".to_vec();
                label.extend_from_slice(atts.key(node.name).unwrap_or(b"?"));
                label
            }
            NodeKind::Text => b"text()".to_vec(),
            NodeKind::Comment => b"comment()".to_vec(),
            NodeKind::ProcessingInstruction => b"processing-instruction()".to_vec(),
            NodeKind::Document => Vec::new(),
        }
    }

    /// Location path of every summary node, in pre-order
    pub fn paths(&self, tags: &Names, atts: &Names) -> Vec<(Vec<u8>, SkelId)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(SkelId, usize)> = self.nodes[0]
            .children
            .iter()
            .rev()
            .map(|&c| (c, usize::MAX))
            .collect();
        while let Some((id, parent_slot)) = stack.pop() {
            let mut path = match out.get(parent_slot) {
                Some((p, _)) => Vec::clone(p),
                None => Vec::new(),
            };
            path.push(b'/');
            path.extend_from_slice(&self.label(id, tags, atts));
            let slot = out.len();
            out.push((path, id));
            stack.extend(
                self.nodes[id.index()]
                    .children
                    .iter()
                    .rev()
                    .map(|&c| (c, slot)),
            );
        }
        out
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Append the persisted form of the tree to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        let mut stack = vec![SkelId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            write_num(out, u64::from(node.name));
            out.push(node.kind.code());
            write_num(out, u64::from(node.count));
            write_num(out, node.children.len() as u64);
            write_num(out, node.text_len);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Read a tree written by [`Skeleton::write`].
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Skeleton> {
        let (root, root_children) = read_record(reader, 0)?;
        if root.kind != NodeKind::Document {
            return Err(StatsError::Decode(format!(
                "skeleton root has kind {:?}",
                root.kind
            )));
        }

        let mut skel = Skeleton {
            nodes: vec![root],
            max_depth: 0,
        };
        // (node, children still to read)
        let mut pending: Vec<(SkelId, u32)> = Vec::new();
        if root_children > 0 {
            pending.push((SkelId::ROOT, root_children));
        }

        loop {
            let Some(top) = pending.last_mut() else {
                break;
            };
            if top.1 == 0 {
                pending.pop();
                continue;
            }
            top.1 -= 1;
            let parent = top.0;

            let parent_level = skel.nodes[parent.index()].level;
            let (mut node, children) = read_record(reader, parent_level)?;
            if node.kind == NodeKind::Element {
                node.level = parent_level + 1;
                skel.max_depth = skel.max_depth.max(node.level);
            }

            let duplicate = skel.nodes[parent.index()].children.iter().any(|c| {
                let n = &skel.nodes[c.index()];
                n.name == node.name && n.kind == node.kind
            });
            if duplicate {
                return Err(StatsError::Decode(format!(
                    "duplicate skeleton child (name {}, kind {:?}) at offset {}",
                    node.name,
                    node.kind,
                    reader.pos()
                )));
            }

            let id = SkelId(skel.nodes.len() as u32);
            skel.nodes.push(node);
            skel.nodes[parent.index()].children.push(id);
            if children > 0 {
                pending.push((id, children));
            }
        }
        Ok(skel)
    }

    /// Persisted form as a standalone buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    /// Read a standalone buffer; trailing bytes are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Skeleton> {
        let mut reader = ByteReader::new(bytes);
        let skel = Self::read(&mut reader)?;
        if !reader.is_at_end() {
            return Err(StatsError::Decode(format!(
                "{} trailing bytes after skeleton",
                bytes.len() - reader.pos()
            )));
        }
        Ok(skel)
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one node record; returns the node and its child count.
fn read_record(reader: &mut ByteReader<'_>, level: u32) -> Result<(SkelNode, u32)> {
    let name = reader.read_num_u32()?;
    let code = reader.read_u8()?;
    let kind = NodeKind::from_code(code)
        .ok_or_else(|| StatsError::Decode(format!("invalid node kind {}", code)))?;
    let count = reader.read_num_u32()?;
    let children = reader.read_num_u32()?;
    let text_len = reader.read_num()?;

    let mut node = SkelNode::new(name, kind, level);
    node.count = count;
    node.text_len = text_len;
    Ok((node, children))
}
