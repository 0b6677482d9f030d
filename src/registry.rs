//! Canonical node/link store
//!
//! Keeps every discovered node keyed by entity id (insertion-ordered),
//! the global directed link list, the root set and the FIFO work queue
//! of nodes still awaiting expansion. Per-node `child_links` lists are
//! a derived index over the global link list: bulk loads rebuild them
//! in one pass, single-edge edits patch them in place.

use std::collections::VecDeque;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::model::{EntityDescriptor, GraphLink, GraphNode};

#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: IndexMap<String, GraphNode>,
    links: Vec<GraphLink>,
    roots: Vec<String>,
    queue: VecDeque<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything; a full load starts from an empty registry.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.roots.clear();
        self.queue.clear();
    }

    /// Insert a newly discovered entity, or overwrite the display
    /// fields of an already-known one.
    ///
    /// First discovery creates the node at `level`, enqueues it for
    /// expansion and, at level 0, adds it to the root set.
    /// Re-discovery via another path overwrites label/name/kind only;
    /// the node is not re-enqueued.
    pub fn upsert_node(&mut self, descriptor: &EntityDescriptor, level: u32) {
        if let Some(existing) = self.nodes.get_mut(&descriptor.id) {
            debug!(id = %descriptor.id, "re-discovered entity, overwriting display fields");
            existing.overwrite_from(descriptor);
            return;
        }

        let node = GraphNode::from_descriptor(descriptor, level);
        self.queue.push_back(node.id.clone());
        if level == 0 {
            self.roots.push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
    }

    /// Append a link to the global link list.
    ///
    /// Adjacency lists are stale until the next `rebuild_adjacency`
    /// call; callers must not prune in between.
    pub fn record_link(&mut self, link: GraphLink) {
        self.links.push(link);
    }

    /// Rebuild every node's `child_links` index from the global link
    /// list in a single pass.
    ///
    /// A link whose source is missing here means a link was recorded
    /// before its endpoint was upserted; that is a builder ordering
    /// defect, not a runtime condition.
    pub fn rebuild_adjacency(&mut self) {
        for node in self.nodes.values_mut() {
            node.child_links.clear();
        }
        let nodes = &mut self.nodes;
        for link in &self.links {
            match nodes.get_mut(&link.source) {
                Some(source) => source.child_links.push(link.clone()),
                None => {
                    debug_assert!(false, "link recorded before source {} existed", link.source);
                    warn!(source = %link.source, target = %link.target,
                        "dropping link with unknown source at adjacency rebuild");
                }
            }
        }
    }

    /// Next discovered-but-unexpanded node id, strictly FIFO.
    pub fn pop_pending(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.roots.iter().any(|r| r == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of links anywhere in the graph pointing at `id`.
    pub fn incoming_link_count(&self, id: &str) -> usize {
        self.links.iter().filter(|l| l.target == id).count()
    }

    /// Remove the first link matching the ordered (source, target)
    /// pair from the global list and from the source's child index.
    pub fn remove_link(&mut self, source: &str, target: &str) -> Option<GraphLink> {
        let idx = self
            .links
            .iter()
            .position(|l| l.source == source && l.target == target)?;
        let link = self.links.remove(idx);
        if let Some(node) = self.nodes.get_mut(source) {
            node.child_links
                .retain(|l| !(l.source == source && l.target == target));
        }
        Some(link)
    }

    /// Remove a node and every link it is the source of, returning
    /// the removed outgoing links. Used by cascading collection.
    pub fn remove_node(&mut self, id: &str) -> Vec<GraphLink> {
        self.nodes.shift_remove(id);
        let mut removed = Vec::new();
        self.links.retain(|l| {
            if l.source == id {
                removed.push(l.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}
