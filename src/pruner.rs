//! Visibility pruning
//!
//! Derives the renderable subgraph from the registry and the per-node
//! collapse flags: a collapsed container contributes itself but none
//! of its descendants. The traversal is iterative and cycle-safe
//! (device peer graphs may contain cycles) and deduplicates nodes by
//! id and links by their ordered endpoint pair, since leaves are often
//! reachable through more than one parent.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{GraphLink, GraphNode};
use crate::registry::NodeRegistry;

/// The node/link subset currently eligible for rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrunedGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl PrunedGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn link_keys(&self) -> HashSet<(&str, &str)> {
        self.links.iter().map(|l| l.key()).collect()
    }
}

/// Compute the pruned view for the current registry contents.
///
/// O(reachable nodes + reachable links); invoked on every collapse
/// toggle and structural edit. Requires a consistent adjacency index,
/// so never call it between a `record_link` batch and the following
/// `rebuild_adjacency`.
pub fn prune(registry: &NodeRegistry) -> PrunedGraph {
    let mut out = PrunedGraph::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut seen_links: HashSet<(String, String)> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();

    for root in registry.roots().iter().rev() {
        stack.push(root.clone());
    }

    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        let Some(node) = registry.node(&id) else {
            continue;
        };
        out.nodes.push(node.clone());

        // A collapsed flag only takes effect on collapsible nodes:
        // childless or leaf-kind nodes always expose their links.
        if node.collapsed && node.is_collapsible() {
            continue;
        }

        for link in node.child_links.iter().rev() {
            if seen_links.insert((link.source.clone(), link.target.clone())) {
                out.links.push(link.clone());
            }
            stack.push(link.target.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityDescriptor, EntityKind, GraphLink, RelationType};

    fn registry_with(
        entities: &[(&str, EntityKind, u32)],
        links: &[(&str, &str, RelationType)],
    ) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        for (id, kind, level) in entities {
            registry.upsert_node(&EntityDescriptor::new(id, id, *kind), *level);
        }
        for (source, target, relation) in links {
            registry.record_link(GraphLink::new(source, target, *relation));
        }
        registry.rebuild_adjacency();
        registry
    }

    fn sample() -> NodeRegistry {
        registry_with(
            &[
                ("r1", EntityKind::Asset, 0),
                ("r2", EntityKind::Asset, 0),
                ("d1", EntityKind::Device, 1),
                ("d2", EntityKind::Device, 2),
            ],
            &[
                ("r1", "d1", RelationType::Contains),
                ("d1", "d2", RelationType::Manages),
            ],
        )
    }

    #[test]
    fn full_view_without_collapse_flags() {
        let registry = sample();
        let pruned = prune(&registry);
        assert_eq!(pruned.node_ids(), ["r1", "r2", "d1", "d2"].into());
        assert_eq!(pruned.link_keys(), [("r1", "d1"), ("d1", "d2")].into());
    }

    #[test]
    fn collapsing_a_root_hides_its_subtree() {
        let mut registry = sample();
        registry.node_mut("r1").unwrap().collapsed = true;
        let pruned = prune(&registry);
        assert_eq!(pruned.node_ids(), ["r1", "r2"].into());
        assert!(pruned.links.is_empty());
    }

    #[test]
    fn collapse_flag_on_a_device_is_inert() {
        let mut registry = sample();
        registry.node_mut("d1").unwrap().collapsed = true;
        let pruned = prune(&registry);
        assert_eq!(pruned.node_ids(), ["r1", "r2", "d1", "d2"].into());
    }

    #[test]
    fn diamond_reachability_deduplicates_nodes_and_links() {
        let registry = registry_with(
            &[
                ("r1", EntityKind::Asset, 0),
                ("a1", EntityKind::Asset, 1),
                ("d1", EntityKind::Device, 1),
                ("d2", EntityKind::Device, 2),
            ],
            &[
                ("r1", "a1", RelationType::Contains),
                ("r1", "d1", RelationType::Contains),
                ("a1", "d2", RelationType::Contains),
                ("d1", "d2", RelationType::Manages),
                // Duplicate discovery path for the same edge.
                ("d1", "d2", RelationType::Manages),
            ],
        );
        let pruned = prune(&registry);
        assert_eq!(pruned.nodes.len(), 4);
        assert_eq!(pruned.links.len(), 4);
        assert_eq!(
            pruned.link_keys(),
            [("r1", "a1"), ("r1", "d1"), ("a1", "d2"), ("d1", "d2")].into()
        );
    }

    #[test]
    fn device_peer_cycles_do_not_loop() {
        let registry = registry_with(
            &[
                ("r1", EntityKind::Asset, 0),
                ("d1", EntityKind::Device, 1),
                ("d2", EntityKind::Device, 2),
            ],
            &[
                ("r1", "d1", RelationType::Contains),
                ("d1", "d2", RelationType::Manages),
                ("d2", "d1", RelationType::Manages),
            ],
        );
        let pruned = prune(&registry);
        assert_eq!(pruned.nodes.len(), 3);
        assert_eq!(pruned.links.len(), 3);
    }

    #[test]
    fn prune_is_idempotent() {
        let mut registry = sample();
        registry.node_mut("r1").unwrap().collapsed = true;
        let first = prune(&registry);
        let second = prune(&registry);
        assert_eq!(first.node_ids(), second.node_ids());
        assert_eq!(first.link_keys(), second.link_keys());
    }

    #[test]
    fn collapse_round_trip_restores_the_view() {
        let mut registry = sample();
        let before = prune(&registry);
        registry.node_mut("r1").unwrap().collapsed = true;
        registry.node_mut("r1").unwrap().collapsed = false;
        let after = prune(&registry);
        assert_eq!(before.node_ids(), after.node_ids());
        assert_eq!(before.link_keys(), after.link_keys());
    }
}
