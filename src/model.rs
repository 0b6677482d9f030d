//! Core graph data model: entity kinds, relation types, nodes and links

use serde::{Deserialize, Serialize};

/// Entity kinds in the relation graph
///
/// A closed set: fetch policy and collapsibility key off this tag, so
/// new kinds mean new policy rows, not open-ended subtyping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Container kind: children may be further assets or devices.
    Asset,
    /// Leaf kind: may only reference other devices (a peer graph,
    /// never a containment hierarchy).
    Device,
}

impl EntityKind {
    /// True for kinds whose children form a containment subtree.
    pub fn is_container(self) -> bool {
        matches!(self, EntityKind::Asset)
    }

    /// Relation type used when expanding a node of this kind.
    pub fn relation_type(self) -> RelationType {
        match self {
            EntityKind::Asset => RelationType::Contains,
            EntityKind::Device => RelationType::Manages,
        }
    }

    /// Child kinds an expansion of this kind may return.
    pub fn child_kinds(self) -> &'static [EntityKind] {
        match self {
            EntityKind::Asset => &[EntityKind::Asset, EntityKind::Device],
            EntityKind::Device => &[EntityKind::Device],
        }
    }
}

/// Relation types between entities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RelationType {
    Contains,
    Manages,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Contains => "Contains",
            RelationType::Manages => "Manages",
        }
    }
}

/// Search direction for a relation query (always outgoing today)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SearchDirection {
    From,
}

/// One child-relation lookup, derived from the node being expanded.
///
/// Mirrors the backend relation-query shape: root entity, direction,
/// a single relation-type filter with allowed child kinds, depth 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationQuery {
    pub root_id: String,
    pub root_kind: EntityKind,
    pub direction: SearchDirection,
    pub relation_type: RelationType,
    pub child_kinds: Vec<EntityKind>,
    pub max_level: u32,
}

impl RelationQuery {
    /// Build the query for expanding `node`, applying the kind policy:
    /// assets fetch contained assets and devices, devices fetch only
    /// the devices they manage.
    pub fn for_node(node: &GraphNode) -> Self {
        Self {
            root_id: node.id.clone(),
            root_kind: node.kind,
            direction: SearchDirection::From,
            relation_type: node.kind.relation_type(),
            child_kinds: node.kind.child_kinds().to_vec(),
            max_level: 1,
        }
    }
}

/// Inbound description of an entity, as supplied by the hosting
/// widget's datasources or by a fetch completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub id: String,
    pub label: String,
    pub name: String,
    pub kind: EntityKind,
    /// Opaque data-source payload, carried through untouched for the
    /// renderer and for follow-up child queries.
    #[serde(default)]
    pub datasource: serde_json::Value,
}

impl EntityDescriptor {
    pub fn new(id: &str, label: &str, kind: EntityKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            name: label.to_string(),
            kind,
            datasource: serde_json::Value::Null,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_datasource(mut self, datasource: serde_json::Value) -> Self {
        self.datasource = datasource;
        self
    }
}

/// Per-node fetch lifecycle during a load
///
/// `Awaiting -> Fulfilled` happens exactly once per node per load; a
/// second completion for a fulfilled node is dropped. `Failed` is
/// terminal for the session (no automatic retry).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FetchState {
    Pending,
    Awaiting,
    Fulfilled,
    Failed,
}

/// A node in the entity graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub name: String,
    pub kind: EntityKind,
    /// Tree depth; 0 = root supplied by widget configuration.
    pub level: u32,
    /// Suppresses rendering of the descendant subtree without
    /// deleting it from the registry. Only meaningful on collapsible
    /// nodes, see [`GraphNode::is_collapsible`].
    pub collapsed: bool,
    /// Set once this node's child fetch has merged.
    pub children_loaded: bool,
    pub fetch_state: FetchState,
    /// Outgoing links, a derived index over the registry's global
    /// link list. Rebuilt by `rebuild_adjacency`, patched in place by
    /// single-edge edits.
    pub child_links: Vec<GraphLink>,
    pub datasource: serde_json::Value,
    /// Renderer-only spatial hints.
    pub position: Option<[f64; 3]>,
    pub fixed_position: Option<[f64; 3]>,
}

impl GraphNode {
    pub fn from_descriptor(descriptor: &EntityDescriptor, level: u32) -> Self {
        Self {
            id: descriptor.id.clone(),
            label: descriptor.label.clone(),
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            level,
            collapsed: false,
            children_loaded: false,
            fetch_state: FetchState::Pending,
            child_links: Vec::new(),
            datasource: descriptor.datasource.clone(),
            position: None,
            fixed_position: None,
        }
    }

    /// Re-discovery via another path overwrites display fields only;
    /// level, collapse state and children are untouched.
    pub fn overwrite_from(&mut self, descriptor: &EntityDescriptor) {
        self.label = descriptor.label.clone();
        self.name = descriptor.name.clone();
        self.kind = descriptor.kind;
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    /// Collapsing is only meaningful on container nodes with at least
    /// one outgoing link; collapsing a device's peer relations has no
    /// containment semantics.
    pub fn is_collapsible(&self) -> bool {
        self.kind.is_container() && !self.child_links.is_empty()
    }
}

/// A directed, typed link between two nodes
///
/// Identity is the ordered (source, target) pair: multiple discovery
/// paths can record the same edge, and the pruner deduplicates on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub relation_type: RelationType,
    /// Display color, derived from the relation type.
    pub color: String,
}

impl GraphLink {
    pub fn new(source: &str, target: &str, relation_type: RelationType) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            relation_type,
            color: String::new(),
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    /// Ordered endpoint pair identifying this link.
    pub fn key(&self) -> (&str, &str) {
        (self.source.as_str(), self.target.as_str())
    }
}
