//! Directed acyclic graph store for execution ordering.
//!
//! Wraps a petgraph `DiGraph` with name-keyed vertices carrying a payload,
//! cycle-safe idempotent edge insertion, and transitive reduction.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::origin::Origin;

/// Payload attached to every vertex: its identity and the accumulated set of
/// variable names it consumes. The reference set is what the runtime reads to
/// feed a task its inputs.
#[derive(Debug, Clone)]
pub struct VertexContext {
    pub name: String,
    pub origin: Origin,
    pub references: BTreeSet<String>,
}

impl VertexContext {
    pub fn new(name: &str, origin: Origin) -> Self {
        Self {
            name: name.to_string(),
            origin,
            references: BTreeSet::new(),
        }
    }
}

/// A named-vertex DAG.
#[derive(Debug, Default)]
pub struct Dag {
    graph: DiGraph<VertexContext, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex with its payload. Names are unique per graph.
    pub fn add_vertex(&mut self, ctx: VertexContext) -> Result<()> {
        if self.nodes.contains_key(&ctx.name) {
            return Err(Error::DuplicateVertex(ctx.name));
        }
        let name = ctx.name.clone();
        let idx = self.graph.add_node(ctx);
        self.nodes.insert(name, idx);
        Ok(())
    }

    pub fn has_vertex(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn vertex(&self, name: &str) -> Option<&VertexContext> {
        self.nodes.get(name).map(|&idx| &self.graph[idx])
    }

    /// Record a consumed variable name on a vertex.
    pub fn add_reference(&mut self, vertex: &str, reference: &str) {
        if let Some(&idx) = self.nodes.get(vertex) {
            self.graph[idx].references.insert(reference.to_string());
        }
    }

    /// Draw an ordering edge `from -> to`.
    ///
    /// Duplicate edges are a no-op. An edge that would close a cycle is
    /// rejected, keeping the graph a DAG at all times.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<()> {
        let &a = self
            .nodes
            .get(from)
            .ok_or_else(|| Error::MissingVertex(from.to_string()))?;
        let &b = self
            .nodes
            .get(to)
            .ok_or_else(|| Error::MissingVertex(to.to_string()))?;

        if self.graph.find_edge(a, b).is_some() {
            return Ok(());
        }
        if has_path_connecting(&self.graph, b, a, None) {
            return Err(Error::CycleDetected {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.graph.add_edge(a, b, ());
        Ok(())
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Whether a path (of any length) leads from `from` to `to`.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    pub fn vertex_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].name.as_str(), self.graph[b].name.as_str()))
            .collect()
    }

    /// Drop every edge implied by a longer existing path.
    ///
    /// The reduction of a DAG is unique, so the per-edge removal order does
    /// not matter, and applying the reduction twice is a no-op.
    pub fn transitive_reduction(&mut self) {
        let endpoints: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .collect();

        for (a, b) in endpoints {
            if let Some(edge) = self.graph.find_edge(a, b) {
                self.graph.remove_edge(edge);
                if !has_path_connecting(&self.graph, a, b, None) {
                    self.graph.add_edge(a, b, ());
                }
            }
        }
    }
}
