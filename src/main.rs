//! Entigraph demo CLI
//!
//! Loads an entity-relation fixture, assembles the graph through the
//! regular async fetch path and prints the pruned view, so the engine
//! can be exercised without a dashboard host.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use entigraph::{
    prune, EntityDescriptor, FetchError, GraphController, GraphEvent, GraphEventSink,
    GraphSettings, PrunedGraph, RelationFetcher, RelationQuery, RelationType,
};

/// Entigraph - entity-relation graph assembly and pruning
///
/// Reads a JSON fixture of entities and relations, loads it through
/// the breadth-first fetch pipeline and prints the renderable view.
#[derive(Parser, Debug)]
#[command(name = "entigraph", version)]
struct Cli {
    /// Fixture file: {"roots": [ids], "entities": [...], "relations": [...]}
    fixture: PathBuf,

    /// Collapse these nodes before printing (repeatable)
    #[arg(long = "collapse", value_name = "ID")]
    collapse: Vec<String>,

    /// Detach a relation before printing, as "source:target" (repeatable)
    #[arg(long = "detach", value_name = "SOURCE:TARGET", value_parser = parse_link)]
    detach: Vec<(String, String)>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

fn parse_link(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .ok_or_else(|| format!("'{s}' is not of the form source:target"))
}

/// On-disk fixture shape
#[derive(Debug, Deserialize)]
struct Fixture {
    roots: Vec<String>,
    entities: Vec<EntityDescriptor>,
    #[serde(default)]
    relations: Vec<FixtureRelation>,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureRelation {
    source: String,
    target: String,
    #[serde(rename = "type")]
    relation_type: RelationType,
}

/// Serves relation pages straight out of the fixture tables.
struct FixtureFetcher {
    entities: HashMap<String, EntityDescriptor>,
    relations: Vec<FixtureRelation>,
}

impl FixtureFetcher {
    fn new(fixture: &Fixture) -> Self {
        Self {
            entities: fixture
                .entities
                .iter()
                .map(|e| (e.id.clone(), e.clone()))
                .collect(),
            relations: fixture.relations.clone(),
        }
    }
}

#[async_trait]
impl RelationFetcher for FixtureFetcher {
    async fn fetch_children(
        &self,
        query: &RelationQuery,
    ) -> Result<Vec<EntityDescriptor>, FetchError> {
        let mut page = Vec::new();
        for relation in &self.relations {
            if relation.source != query.root_id || relation.relation_type != query.relation_type {
                continue;
            }
            let child = self
                .entities
                .get(&relation.target)
                .ok_or_else(|| FetchError(format!("unknown entity {}", relation.target)))?;
            if query.child_kinds.contains(&child.kind) {
                page.push(child.clone());
            }
        }
        Ok(page)
    }
}

/// Forwards engine signals to the log.
struct LogSink;

impl GraphEventSink for LogSink {
    fn on_event(&mut self, event: GraphEvent) {
        match event {
            GraphEvent::Warning(message) => warn!("{message}"),
            GraphEvent::LoadFailed(reason) => warn!("load failed: {reason}"),
            GraphEvent::LoadFinished { empty } => info!(empty, "load finished"),
            GraphEvent::PrunedChanged(_) => {}
        }
    }
}

fn print_tree(pruned: &PrunedGraph) {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for link in &pruned.links {
        children
            .entry(link.source.as_str())
            .or_default()
            .push(link.target.as_str());
    }
    let labels: HashMap<&str, String> = pruned
        .nodes
        .iter()
        .map(|n| {
            let marker = if n.collapsed && n.is_collapsible() {
                " [collapsed]"
            } else {
                ""
            };
            (
                n.id.as_str(),
                format!("{} ({:?}, level {}){}", n.label, n.kind, n.level, marker),
            )
        })
        .collect();

    let mut printed = std::collections::HashSet::new();
    let mut stack: Vec<(&str, usize)> = pruned
        .nodes
        .iter()
        .filter(|n| n.is_root())
        .rev()
        .map(|n| (n.id.as_str(), 0))
        .collect();
    while let Some((id, depth)) = stack.pop() {
        let label = labels.get(id).cloned().unwrap_or_else(|| id.to_string());
        println!("{}{}", "  ".repeat(depth), label);
        if !printed.insert(id) {
            continue;
        }
        if let Some(kids) = children.get(id) {
            for kid in kids.iter().rev() {
                stack.push((kid, depth + 1));
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let raw = std::fs::read_to_string(&cli.fixture)
        .with_context(|| format!("reading fixture {}", cli.fixture.display()))?;
    let fixture: Fixture = serde_json::from_str(&raw).context("parsing fixture")?;

    let roots: Vec<EntityDescriptor> = fixture
        .roots
        .iter()
        .map(|id| {
            fixture
                .entities
                .iter()
                .find(|e| &e.id == id)
                .cloned()
                .with_context(|| format!("root {id} not present in entities"))
        })
        .collect::<Result<_>>()?;

    let fetcher = FixtureFetcher::new(&fixture);
    let mut controller =
        GraphController::new(fetcher, GraphSettings::default(), Box::new(LogSink));

    let stats = controller.load(&roots).await?;
    info!("loaded: {}", stats.summary());

    for id in &cli.collapse {
        controller.toggle_collapse(id)?;
    }
    for (source, target) in &cli.detach {
        controller.detach_relation(source, target)?;
    }

    let pruned = prune(controller.registry());
    match cli.format {
        Format::Text => print_tree(&pruned),
        Format::Json => println!("{}", serde_json::to_string_pretty(&pruned)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    run(Cli::parse()).await
}
