//! Breadth-first graph assembly
//!
//! Drains the registry's work queue with exactly one relation fetch in
//! flight at a time: sequential fetches bound backend load and keep
//! discovery order deterministic, at the cost of load latency growing
//! with depth times fan-out. A fetch failure marks that node
//! permanently unexpanded for the session and the drain continues.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::model::{EntityDescriptor, FetchState, GraphLink, RelationQuery, RelationType};
use crate::registry::NodeRegistry;
use crate::settings::GraphSettings;

/// Backend seam: one page of child entities for a relation query.
///
/// Implementations wrap the widget subscription transport; the engine
/// only sees descriptors and transport errors.
#[async_trait]
pub trait RelationFetcher: Send + Sync {
    async fn fetch_children(
        &self,
        query: &RelationQuery,
    ) -> Result<Vec<EntityDescriptor>, FetchError>;
}

/// Statistics from a full load
#[derive(Debug, Default)]
pub struct LoadStats {
    /// Nodes in the registry after the drain.
    pub nodes: usize,
    /// Links recorded during the drain.
    pub links: usize,
    /// Fetches issued (one per dequeued node).
    pub fetches: usize,
    /// Nodes whose fetch failed, with the failure message.
    pub failures: Vec<(String, FetchError)>,
}

impl LoadStats {
    pub fn summary(&self) -> String {
        format!(
            "{} nodes, {} links, {} fetches, {} failed",
            self.nodes,
            self.links,
            self.fetches,
            self.failures.len()
        )
    }
}

/// Orchestrates the breadth-first expansion of the registry.
pub struct GraphBuilder<F> {
    fetcher: F,
    settings: GraphSettings,
}

impl<F: RelationFetcher> GraphBuilder<F> {
    pub fn new(fetcher: F, settings: GraphSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Reset the registry and rebuild it from the given roots.
    ///
    /// Upserts every root at level 0, then drains the work queue
    /// strictly FIFO, one awaited fetch per node. Only after the queue
    /// is empty is the adjacency index rebuilt; callers must not prune
    /// mid-drain.
    pub async fn load_all(
        &self,
        registry: &mut NodeRegistry,
        roots: &[EntityDescriptor],
    ) -> LoadStats {
        registry.reset();
        let mut stats = LoadStats::default();

        for descriptor in roots {
            registry.upsert_node(descriptor, 0);
        }

        while let Some(id) = registry.pop_pending() {
            let query = {
                // Node is always present: ids only enter the queue via upsert.
                let node = registry
                    .node_mut(&id)
                    .expect("queued node missing from registry");
                node.fetch_state = FetchState::Awaiting;
                RelationQuery::for_node(node)
            };

            stats.fetches += 1;
            debug!(node = %id, relation = query.relation_type.as_str(), "fetching children");

            match self.fetcher.fetch_children(&query).await {
                Ok(page) => {
                    self.merge_page(registry, &id, query.relation_type, &page);
                }
                Err(err) => {
                    warn!(node = %id, error = %err, "relation fetch failed, node stays unexpanded");
                    if let Some(node) = registry.node_mut(&id) {
                        node.fetch_state = FetchState::Failed;
                    }
                    stats.failures.push((id, err));
                }
            }
        }

        registry.rebuild_adjacency();

        stats.nodes = registry.node_count();
        stats.links = registry.links().len();
        info!("graph load complete: {}", stats.summary());
        stats
    }

    /// Merge one fetch completion into the registry: upsert each child
    /// one level below its parent and record the typed parent->child
    /// link.
    ///
    /// Returns false (and merges nothing) when the parent is already
    /// fulfilled: the underlying subscription mechanism can notify the
    /// same completion more than once.
    pub fn merge_page(
        &self,
        registry: &mut NodeRegistry,
        parent_id: &str,
        relation_type: RelationType,
        page: &[EntityDescriptor],
    ) -> bool {
        let parent_level = match registry.node(parent_id) {
            Some(parent) if parent.fetch_state == FetchState::Fulfilled => {
                debug!(node = %parent_id, "duplicate fetch completion ignored");
                return false;
            }
            Some(parent) => parent.level,
            None => {
                debug!(node = %parent_id, "fetch completion for unknown node ignored");
                return false;
            }
        };

        for child in page {
            registry.upsert_node(child, parent_level + 1);
            let color = self.settings.link_color_for(relation_type).to_string();
            registry.record_link(
                GraphLink::new(parent_id, &child.id, relation_type).with_color(&color),
            );
        }

        let parent = registry
            .node_mut(parent_id)
            .expect("parent disappeared during merge");
        parent.children_loaded = true;
        parent.fetch_state = FetchState::Fulfilled;
        true
    }
}
