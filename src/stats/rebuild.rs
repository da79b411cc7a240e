//! Statistics Rebuilder
//!
//! Single pass over all positions. Each step reads the node kind and parent
//! (scanning), pops closed ancestors off the stack (ascending) and feeds the
//! node into the dictionaries and the path summary (applying).

use std::time::{Duration, Instant};

use crate::config::{StackCheck, StatsConfig};
use crate::data::{NodeKind, StatsData};
use crate::error::{Result, StatsError};
use crate::skel::{SkelId, Skeleton};

/// Phase of the rebuild state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
    /// Reading the next position
    Scanning,
    /// Popping ancestors that do not enclose the current position
    Ascending,
    /// Dispatching the current position
    Applying,
    /// All positions visited
    Done,
}

/// Outcome of a completed rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    /// Positions visited
    pub size: u32,
    /// Deepest element nesting
    pub height: u32,
    pub elements: u32,
    pub attributes: u32,
    pub texts: u32,
    /// Nodes in the rebuilt path summary
    pub summary_nodes: usize,
    /// Inconsistent positions tolerated in trust mode
    pub inconsistencies: u32,
    pub elapsed: Duration,
}

/// An element whose descendants may still follow
#[derive(Debug, Clone, Copy)]
struct OpenContext {
    pre: u32,
    tag: u32,
    skel: SkelId,
}

/// Step-wise statistics rebuild over one document
///
/// Callers that want to abort a long rebuild drive [`step`](Self::step)
/// themselves and stop between positions; [`finish`](Self::finish) runs
/// the remaining positions and persists the result.
pub struct StatsRebuilder {
    config: StatsConfig,
    pre: u32,
    size: u32,
    stack: Vec<OpenContext>,
    skeleton: Skeleton,
    height: u32,
    state: RebuildState,
    /// Scratch copies of the current name and value
    name_buf: Vec<u8>,
    value_buf: Vec<u8>,
    elements: u32,
    attributes: u32,
    texts: u32,
    inconsistencies: u32,
    started: Instant,
}

impl StatsRebuilder {
    /// Start a rebuild: clears existing statistics and marks them stale.
    pub fn new<D: StatsData>(data: &mut D, config: StatsConfig) -> Self {
        data.tags_mut().reset_stats();
        data.atts_mut().reset_stats();
        data.meta_mut().dirty = true;

        let size = data.size();
        tracing::info!(size, stack_check = ?config.stack_check, "rebuilding statistics");

        StatsRebuilder {
            config,
            pre: 0,
            size,
            stack: Vec::with_capacity(32),
            skeleton: Skeleton::new(),
            height: 0,
            state: if size == 0 {
                RebuildState::Done
            } else {
                RebuildState::Scanning
            },
            name_buf: Vec::with_capacity(64),
            value_buf: Vec::with_capacity(256),
            elements: 0,
            attributes: 0,
            texts: 0,
            inconsistencies: 0,
            started: Instant::now(),
        }
    }

    /// Next position to visit
    #[inline]
    pub fn position(&self) -> u32 {
        self.pre
    }

    /// Total number of positions
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Completed fraction (`pre / size`)
    pub fn progress(&self) -> f64 {
        if self.size == 0 {
            1.0
        } else {
            f64::from(self.pre) / f64::from(self.size)
        }
    }

    /// Current phase; after an error, the phase that failed
    #[inline]
    pub fn state(&self) -> RebuildState {
        self.state
    }

    /// Deepest element nesting so far
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Path summary built so far
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Visit one position. Returns false once all positions are visited.
    pub fn step<D: StatsData>(&mut self, data: &mut D) -> Result<bool> {
        if self.pre >= self.size {
            self.state = RebuildState::Done;
            return Ok(false);
        }
        let pre = self.pre;

        self.state = RebuildState::Scanning;
        let kind = data.kind(pre);
        let parent = data.parent(pre);

        self.state = RebuildState::Ascending;
        self.ascend(data, pre, kind, parent)?;

        self.state = RebuildState::Applying;
        self.apply(data, pre, kind)?;

        self.pre += 1;
        let interval = self.config.progress_interval;
        if interval > 0 && self.pre % interval == 0 {
            tracing::debug!(pre = self.pre, size = self.size, progress = self.progress(), "statistics progress");
        }

        self.state = if self.pre >= self.size {
            RebuildState::Done
        } else {
            RebuildState::Scanning
        };
        Ok(self.state != RebuildState::Done)
    }

    /// Visit all remaining positions, then store and flush the statistics.
    pub fn finish<D: StatsData>(mut self, data: &mut D) -> Result<RebuildReport> {
        while self.step(data)? {}

        debug_assert_eq!(self.skeleton.max_depth(), self.height);
        if self.inconsistencies > 0 {
            tracing::warn!(
                count = self.inconsistencies,
                "document violates ancestor stack discipline; statistics may be skewed"
            );
        }

        let meta = data.meta_mut();
        meta.height = self.height;
        meta.dirty = false;
        data.tags_mut().set_stats_computed(true);
        data.atts_mut().set_stats_computed(true);

        let report = RebuildReport {
            size: self.size,
            height: self.height,
            elements: self.elements,
            attributes: self.attributes,
            texts: self.texts,
            summary_nodes: self.skeleton.len(),
            inconsistencies: self.inconsistencies,
            elapsed: self.started.elapsed(),
        };
        data.install_summary(self.skeleton);

        data.flush().map_err(|e| {
            tracing::error!(error = %e, "flushing statistics failed");
            StatsError::Flush(e.to_string())
        })?;

        tracing::info!(
            size = report.size,
            height = report.height,
            summary_nodes = report.summary_nodes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "statistics rebuilt"
        );
        Ok(report)
    }

    /// Context for the next node: innermost open element or the root
    #[inline]
    fn context(&self) -> SkelId {
        self.stack.last().map_or(SkelId::ROOT, |c| c.skel)
    }

    fn ascend<D: StatsData>(
        &mut self,
        data: &D,
        pre: u32,
        kind: NodeKind,
        parent: Option<u32>,
    ) -> Result<()> {
        while let Some(top) = self.stack.last() {
            if parent.map_or(true, |p| top.pre > p) {
                self.stack.pop();
            } else {
                break;
            }
        }

        if let Some(reason) = self.inconsistency(data, pre, kind, parent) {
            match self.config.stack_check {
                StackCheck::Validate => {
                    return Err(StatsError::Malformed {
                        pre,
                        parent,
                        reason,
                    })
                }
                StackCheck::Trust => self.inconsistencies += 1,
            }
        }
        Ok(())
    }

    /// Check the stack discipline after ascending.
    fn inconsistency<D: StatsData>(
        &self,
        data: &D,
        pre: u32,
        kind: NodeKind,
        parent: Option<u32>,
    ) -> Option<&'static str> {
        let Some(p) = parent else {
            return (kind == NodeKind::Attribute).then_some("attribute without owner element");
        };
        if p >= pre {
            return Some("parent does not precede node");
        }
        match self.stack.last() {
            Some(top) if top.pre == p => None,
            // Documents never open a context
            None if data.kind(p) == NodeKind::Document => None,
            _ => Some("parent is not an open element"),
        }
    }

    fn apply<D: StatsData>(&mut self, data: &mut D, pre: u32, kind: NodeKind) -> Result<()> {
        match kind {
            NodeKind::Element => {
                let name = data.name_id(pre);
                let key = data.tags().key(name).ok_or(StatsError::Malformed {
                    pre,
                    parent: data.parent(pre),
                    reason: "unknown element name id",
                })?;
                self.name_buf.clear();
                self.name_buf.extend_from_slice(key);

                let tag = data.tags_mut().index(&self.name_buf, None)?;
                let ctx = self.context();
                let skel = self.skeleton.enter(ctx, tag, NodeKind::Element);
                self.stack.push(OpenContext { pre, tag, skel });
                self.height = self.height.max(self.stack.len() as u32);
                self.elements += 1;
            }
            NodeKind::Attribute => {
                let name = data.name_id(pre);
                let key = data.atts().key(name).ok_or(StatsError::Malformed {
                    pre,
                    parent: data.parent(pre),
                    reason: "unknown attribute name id",
                })?;
                self.name_buf.clear();
                self.name_buf.extend_from_slice(key);
                self.value_buf.clear();
                self.value_buf.extend_from_slice(data.value(pre));

                let att = data
                    .atts_mut()
                    .index(&self.name_buf, Some(&self.value_buf))?;
                let ctx = self.context();
                let skel = self.skeleton.enter(ctx, att, NodeKind::Attribute);
                self.skeleton.add_text(skel, self.value_buf.len() as u64);
                self.attributes += 1;
            }
            NodeKind::Text | NodeKind::Document => {
                if let Some(top) = self.stack.last().copied() {
                    self.value_buf.clear();
                    self.value_buf.extend_from_slice(data.value(pre));
                    data.tags_mut().index_id(top.tag, &self.value_buf)?;
                    self.skeleton.add_text(top.skel, self.value_buf.len() as u64);
                }
                if kind == NodeKind::Text {
                    self.texts += 1;
                }
            }
            NodeKind::Comment | NodeKind::ProcessingInstruction => {
                let ctx = self.context();
                self.skeleton.enter(ctx, 0, kind);
            }
        }
        Ok(())
    }
}

/// Rebuild all statistics of `data` in one pass.
pub fn rebuild<D: StatsData>(data: &mut D, config: &StatsConfig) -> Result<RebuildReport> {
    StatsRebuilder::new(data, config.clone()).finish(data)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::data::MemDataBuilder;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Event {
        Open(u8),
        Attr(u8),
        Text(u8),
        Close,
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![
            3 => (0u8..4).prop_map(Event::Open),
            1 => (0u8..3).prop_map(Event::Attr),
            2 => (1u8..8).prop_map(Event::Text),
            3 => Just(Event::Close),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn height_and_counts_match_builder(events in proptest::collection::vec(event(), 0..120)) {
            let config = StatsConfig::default();
            let mut b = MemDataBuilder::new(&config);
            let mut max_depth = 0u32;
            let (mut elements, mut texts, mut text_bytes) = (0u32, 0u32, 0u64);

            for ev in &events {
                match ev {
                    Event::Open(n) => {
                        b.open_element(format!("e{}", n).as_bytes()).unwrap();
                        elements += 1;
                        max_depth = max_depth.max(b.depth() as u32);
                    }
                    Event::Attr(n) if b.depth() > 0 => {
                        b.attribute(format!("a{}", n).as_bytes(), b"v").unwrap();
                    }
                    Event::Text(len) if b.depth() > 0 => {
                        b.text(&vec![b'x'; *len as usize]).unwrap();
                        texts += 1;
                        text_bytes += u64::from(*len);
                    }
                    Event::Close => {
                        b.close();
                    }
                    _ => {}
                }
            }
            let mut data = b.finish();
            let report = rebuild(&mut data, &config).unwrap();

            prop_assert_eq!(report.height, max_depth);
            prop_assert_eq!(report.elements, elements);
            prop_assert_eq!(report.texts, texts);
            prop_assert_eq!(report.inconsistencies, 0);

            let skel = data.skeleton();
            prop_assert_eq!(skel.max_depth(), max_depth);
            let mut counted = 0u32;
            let mut text_total = 0u64;
            for id in skel.descendants() {
                let node = skel.get(id).unwrap();
                if node.kind == NodeKind::Element {
                    counted += node.count;
                    text_total += node.text_len;
                }
            }
            prop_assert_eq!(counted, elements);
            prop_assert_eq!(text_total, text_bytes);
        }
    }
}
