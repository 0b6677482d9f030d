//! Incremental graph edits
//!
//! Supports the ad-hoc relation edits the tooltip controls expose
//! (add / remove / move device associations) without a full re-fetch.
//! Detaching a relation garbage-collects the orphaned subtree by
//! reference counting over the global link list, driven by an explicit
//! work-list so deep chains cannot exhaust the call stack.

use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::model::{EntityDescriptor, GraphLink, RelationType};
use crate::registry::NodeRegistry;
use crate::settings::GraphSettings;

/// Attach a child entity under an existing parent.
///
/// Upserts the child one level below the parent, records the typed
/// link and patches the parent's child index directly; a single-edge
/// change needs no full adjacency rebuild.
pub fn attach_child(
    registry: &mut NodeRegistry,
    parent_id: &str,
    child: &EntityDescriptor,
    relation_type: RelationType,
    settings: &GraphSettings,
) -> GraphResult<()> {
    let parent_level = registry
        .node(parent_id)
        .ok_or_else(|| GraphError::UnknownNode(parent_id.to_string()))?
        .level;

    registry.upsert_node(child, parent_level + 1);

    let link = GraphLink::new(parent_id, &child.id, relation_type)
        .with_color(settings.link_color_for(relation_type));
    registry.record_link(link.clone());
    if let Some(parent) = registry.node_mut(parent_id) {
        parent.child_links.push(link);
    }
    debug!(parent = %parent_id, child = %child.id, "attached child relation");
    Ok(())
}

/// Remove the link (source, target) and collect every node left
/// unreachable by the removal.
///
/// A node with no remaining incoming link anywhere in the graph is
/// removed, and its own outgoing links are pushed onto the work-list
/// for the same treatment. Roots are never collected, by definition.
pub fn detach_and_collect(
    registry: &mut NodeRegistry,
    source_id: &str,
    target_id: &str,
) -> GraphResult<()> {
    registry
        .remove_link(source_id, target_id)
        .ok_or_else(|| GraphError::UnknownLink {
            source_id: source_id.to_string(),
            target: target_id.to_string(),
        })?;

    let mut worklist = vec![target_id.to_string()];
    while let Some(id) = worklist.pop() {
        if registry.is_root(&id) || registry.node(&id).is_none() {
            continue;
        }
        if registry.incoming_link_count(&id) > 0 {
            // Still contained or managed through another path.
            continue;
        }
        debug!(node = %id, "collecting unreachable node");
        for removed in registry.remove_node(&id) {
            worklist.push(removed.target);
        }
    }
    Ok(())
}
