//! Widget-facing graph controller
//!
//! Owns the registry and drives the builder, pruner and mutation
//! engine on behalf of the hosting widget: full loads, collapse
//! toggles, drag-end position fixing and relation edits. Structure
//! changes are pushed to a [`GraphEventSink`] (the render adapter /
//! host) as pruned-view snapshots and load/warning signals.
//!
//! A load and an edit are never concurrently active: edits are only
//! accepted once `data_loaded` is set and no other edit is pending,
//! a single-flag reentrancy guard the async drain loop relies on.

use tracing::{debug, warn};

use crate::builder::{GraphBuilder, LoadStats, RelationFetcher};
use crate::error::{GraphError, GraphResult};
use crate::model::{EntityDescriptor, RelationType};
use crate::mutation;
use crate::pruner::{prune, PrunedGraph};
use crate::registry::NodeRegistry;
use crate::settings::GraphSettings;

/// Outbound signals consumed by the render adapter and host widget.
#[derive(Debug)]
pub enum GraphEvent {
    /// Structure changed; carries the new renderable subgraph.
    PrunedChanged(PrunedGraph),
    /// Full load finished; `empty` toggles the host's no-data state.
    LoadFinished { empty: bool },
    /// Every fetch of the load failed; the host may show an error state.
    LoadFailed(String),
    /// Non-fatal notification (single fetch failure, refused edit),
    /// shown as a toast/banner.
    Warning(String),
}

pub trait GraphEventSink: Send {
    fn on_event(&mut self, event: GraphEvent);
}

/// Sink that drops everything; for headless use and tests.
pub struct NullSink;

impl GraphEventSink for NullSink {
    fn on_event(&mut self, _event: GraphEvent) {}
}

pub struct GraphController<F> {
    registry: NodeRegistry,
    builder: GraphBuilder<F>,
    settings: GraphSettings,
    sink: Box<dyn GraphEventSink>,
    data_loaded: bool,
    edit_in_flight: bool,
    /// Role gate supplied by the host's auth-context lookup.
    can_edit: bool,
}

impl<F: RelationFetcher> GraphController<F> {
    pub fn new(fetcher: F, settings: GraphSettings, sink: Box<dyn GraphEventSink>) -> Self {
        let builder = GraphBuilder::new(fetcher, settings.clone());
        Self {
            registry: NodeRegistry::new(),
            builder,
            settings,
            sink,
            data_loaded: false,
            edit_in_flight: false,
            can_edit: true,
        }
    }

    pub fn with_edit_role(mut self, can_edit: bool) -> Self {
        self.can_edit = can_edit;
        self
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn is_loaded(&self) -> bool {
        self.data_loaded
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Rebuild the full graph from the configured root descriptors.
    ///
    /// Emits one `Warning` per failed fetch, then `LoadFinished` (or
    /// `LoadFailed` when every issued fetch failed) and the initial
    /// `PrunedChanged` snapshot.
    pub async fn load(&mut self, roots: &[EntityDescriptor]) -> GraphResult<LoadStats> {
        if self.edit_in_flight {
            return Err(GraphError::Busy);
        }
        self.data_loaded = false;

        let stats = self.builder.load_all(&mut self.registry, roots).await;

        for (node_id, err) in &stats.failures {
            let err = GraphError::Fetch {
                node_id: node_id.clone(),
                source: err.clone(),
            };
            self.sink.on_event(GraphEvent::Warning(err.to_string()));
        }

        self.data_loaded = true;
        if stats.fetches > 0 && stats.failures.len() == stats.fetches {
            warn!("all {} fetches failed", stats.fetches);
            self.sink
                .on_event(GraphEvent::LoadFailed("relation backend unreachable".to_string()));
        } else {
            self.sink.on_event(GraphEvent::LoadFinished {
                empty: self.registry.is_empty(),
            });
        }
        self.emit_pruned();
        Ok(stats)
    }

    /// Flip the collapse flag of a collapsible node.
    ///
    /// Returns whether the flag changed; the interaction is a no-op on
    /// devices and childless nodes, so no view update is emitted for
    /// them.
    pub fn toggle_collapse(&mut self, id: &str) -> GraphResult<bool> {
        self.require_loaded()?;
        let node = self
            .registry
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        if !node.is_collapsible() {
            debug!(node = %id, "ignoring collapse toggle on non-collapsible node");
            return Ok(false);
        }
        node.collapsed = !node.collapsed;
        self.emit_pruned();
        Ok(true)
    }

    /// Drag-end hook: pin a node at the dragged position.
    pub fn fix_position(&mut self, id: &str, position: [f64; 3]) -> GraphResult<()> {
        let node = self
            .registry
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.position = Some(position);
        if self.settings.fix_position_after_drag {
            node.fixed_position = Some(position);
        }
        Ok(())
    }

    /// Release a pinned node back to the simulation.
    pub fn release_position(&mut self, id: &str) -> GraphResult<()> {
        let node = self
            .registry
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.fixed_position = None;
        Ok(())
    }

    /// Attach a new child relation under `parent_id`.
    pub fn attach_child(
        &mut self,
        parent_id: &str,
        child: &EntityDescriptor,
        relation_type: RelationType,
    ) -> GraphResult<()> {
        self.guarded_edit(|registry, settings| {
            mutation::attach_child(registry, parent_id, child, relation_type, settings)
        })
    }

    /// Remove a relation and collect any subtree it orphaned.
    pub fn detach_relation(&mut self, source_id: &str, target_id: &str) -> GraphResult<()> {
        self.guarded_edit(|registry, _| mutation::detach_and_collect(registry, source_id, target_id))
    }

    /// Move a device association from one parent to another: attach
    /// under the new parent first, then detach the old link, so the
    /// device is never without an incoming link and cannot be
    /// collected mid-move.
    pub fn move_device(
        &mut self,
        device_id: &str,
        from_parent: &str,
        to_parent: &str,
    ) -> GraphResult<()> {
        self.guarded_edit(|registry, settings| {
            let descriptor = {
                let node = registry
                    .node(device_id)
                    .ok_or_else(|| GraphError::UnknownNode(device_id.to_string()))?;
                EntityDescriptor {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    name: node.name.clone(),
                    kind: node.kind,
                    datasource: node.datasource.clone(),
                }
            };
            let relation_type = registry
                .node(to_parent)
                .ok_or_else(|| GraphError::UnknownNode(to_parent.to_string()))?
                .kind
                .relation_type();
            mutation::attach_child(registry, to_parent, &descriptor, relation_type, settings)?;
            mutation::detach_and_collect(registry, from_parent, device_id)
        })
    }

    fn require_loaded(&self) -> GraphResult<()> {
        if !self.data_loaded || self.edit_in_flight {
            return Err(GraphError::Busy);
        }
        Ok(())
    }

    fn guarded_edit<T>(
        &mut self,
        edit: impl FnOnce(&mut NodeRegistry, &GraphSettings) -> GraphResult<T>,
    ) -> GraphResult<T> {
        if !self.can_edit {
            self.sink.on_event(GraphEvent::Warning(
                "relation editing requires an editing role".to_string(),
            ));
            return Err(GraphError::Forbidden);
        }
        self.require_loaded()?;

        self.edit_in_flight = true;
        let result = edit(&mut self.registry, &self.settings);
        self.edit_in_flight = false;

        match result {
            Ok(value) => {
                self.emit_pruned();
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }

    fn emit_pruned(&mut self) {
        let pruned = prune(&self.registry);
        self.sink.on_event(GraphEvent::PrunedChanged(pruned));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::model::{EntityKind, RelationQuery};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct EmptyFetcher;

    #[async_trait]
    impl RelationFetcher for EmptyFetcher {
        async fn fetch_children(
            &self,
            _query: &RelationQuery,
        ) -> Result<Vec<EntityDescriptor>, FetchError> {
            Ok(Vec::new())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl RelationFetcher for FailingFetcher {
        async fn fetch_children(
            &self,
            _query: &RelationQuery,
        ) -> Result<Vec<EntityDescriptor>, FetchError> {
            Err(FetchError("connection refused".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl GraphEventSink for RecordingSink {
        fn on_event(&mut self, event: GraphEvent) {
            let tag = match event {
                GraphEvent::PrunedChanged(_) => "pruned".to_string(),
                GraphEvent::LoadFinished { empty } => format!("finished empty={empty}"),
                GraphEvent::LoadFailed(_) => "failed".to_string(),
                GraphEvent::Warning(_) => "warning".to_string(),
            };
            self.events.lock().unwrap().push(tag);
        }
    }

    fn asset(id: &str) -> EntityDescriptor {
        EntityDescriptor::new(id, id, EntityKind::Asset)
    }

    #[tokio::test]
    async fn load_emits_finished_then_pruned() {
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        let mut controller =
            GraphController::new(EmptyFetcher, GraphSettings::default(), Box::new(sink));

        controller.load(&[asset("r1")]).await.unwrap();

        assert!(controller.is_loaded());
        assert!(!controller.is_empty());
        assert_eq!(
            *events.lock().unwrap(),
            vec!["finished empty=false".to_string(), "pruned".to_string()]
        );
    }

    #[tokio::test]
    async fn total_fetch_outage_reports_load_failed() {
        let sink = RecordingSink::default();
        let events = sink.events.clone();
        let mut controller =
            GraphController::new(FailingFetcher, GraphSettings::default(), Box::new(sink));

        let stats = controller.load(&[asset("r1")]).await.unwrap();

        assert_eq!(stats.failures.len(), 1);
        let events = events.lock().unwrap();
        assert!(events.contains(&"warning".to_string()));
        assert!(events.contains(&"failed".to_string()));
    }

    #[tokio::test]
    async fn edits_before_load_are_rejected() {
        let mut controller = GraphController::new(
            EmptyFetcher,
            GraphSettings::default(),
            Box::new(NullSink),
        );
        let err = controller.detach_relation("a", "b").unwrap_err();
        assert!(matches!(err, GraphError::Busy));
    }

    #[tokio::test]
    async fn edits_without_role_are_forbidden() {
        let mut controller = GraphController::new(
            EmptyFetcher,
            GraphSettings::default(),
            Box::new(NullSink),
        )
        .with_edit_role(false);
        controller.load(&[asset("r1")]).await.unwrap();

        let err = controller
            .attach_child(
                "r1",
                &EntityDescriptor::new("d1", "d1", EntityKind::Device),
                RelationType::Contains,
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::Forbidden));
    }

    #[tokio::test]
    async fn drag_end_pins_position_per_settings() {
        let mut controller = GraphController::new(
            EmptyFetcher,
            GraphSettings::default(),
            Box::new(NullSink),
        );
        controller.load(&[asset("r1")]).await.unwrap();

        controller.fix_position("r1", [1.0, 2.0, 3.0]).unwrap();
        let node = controller.registry().node("r1").unwrap();
        assert_eq!(node.fixed_position, Some([1.0, 2.0, 3.0]));

        controller.release_position("r1").unwrap();
        assert_eq!(controller.registry().node("r1").unwrap().fixed_position, None);
    }
}
