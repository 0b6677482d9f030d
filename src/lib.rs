//! Entigraph - entity-relation graph assembly and pruning
//!
//! Builds an in-memory node/link graph of hierarchical entity relations
//! (assets and devices) by progressively fetching children from an
//! asynchronous relation-query backend, then derives the renderable
//! subgraph from per-node collapse state. Rendering, widget lifecycle
//! and transport are external collaborators behind trait seams.

pub mod builder;
pub mod controller;
pub mod error;
pub mod model;
pub mod mutation;
pub mod pruner;
pub mod registry;
pub mod settings;

pub use builder::{GraphBuilder, LoadStats, RelationFetcher};
pub use controller::{GraphController, GraphEvent, GraphEventSink, NullSink};
pub use error::{FetchError, GraphError};
pub use model::{
    EntityDescriptor, EntityKind, FetchState, GraphLink, GraphNode, RelationQuery, RelationType,
};
pub use mutation::{attach_child, detach_and_collect};
pub use pruner::{prune, PrunedGraph};
pub use registry::NodeRegistry;
pub use settings::GraphSettings;
