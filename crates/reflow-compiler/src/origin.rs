//! Traversal origin tracking and result accumulation.

use parking_lot::Mutex;
use reflow_core::Gvk;
use std::collections::HashMap;
use std::fmt;

/// The root collection a visited element belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FowKind {
    #[default]
    For,
    Own,
    Watch,
    Service,
}

impl fmt::Display for FowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FowKind::For => "for",
            FowKind::Own => "own",
            FowKind::Watch => "watch",
            FowKind::Service => "service",
        };
        f.write_str(s)
    }
}

/// The operation a pipeline runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Operation {
    Apply,
    Delete,
    #[default]
    None,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Apply => "apply",
            Operation::Delete => "delete",
            Operation::None => "none",
        };
        f.write_str(s)
    }
}

/// The semantic origin of a visited element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    /// A for/own/watch resource declaration.
    #[default]
    Fow,
    /// A standalone service function.
    Service,
    /// A pipeline variable binding.
    Variable,
    /// A pipeline task.
    Task,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Origin::Fow => "fow",
            Origin::Service => "service",
            Origin::Variable => "variable",
            Origin::Task => "task",
        };
        f.write_str(s)
    }
}

/// Where a visited configuration node lives.
///
/// Built afresh for every walk step and cloned on every scope descent, so
/// sibling branches never observe each other's mutations.
#[derive(Debug, Clone, Default)]
pub struct OriginContext {
    pub fow: FowKind,
    /// Name of the root declaration anchoring the current scope.
    pub root_vertex: String,
    /// Resolved identity of the root resource, if resolution succeeded.
    pub gvk: Option<Gvk>,
    pub operation: Operation,
    /// Name of the owning pipeline, empty outside pipelines.
    pub pipeline: String,
    pub origin: Origin,
    /// Whether the node sits inside a nested block.
    pub block: bool,
    /// Block nesting depth; 0 at pipeline level.
    pub block_depth: usize,
    /// Name of the vertex rooting the current block, empty at depth 0.
    pub block_vertex: String,
    /// Name of the vertex being visited.
    pub vertex: String,
    /// Name of the local variable currently being processed, if any.
    pub local_var: String,
    /// Local variable names visible at this point.
    pub local_vars: HashMap<String, String>,
}

impl OriginContext {
    /// Context for a root declaration or service.
    pub fn root(fow: FowKind, name: &str, origin: Origin) -> Self {
        Self {
            fow,
            root_vertex: name.to_string(),
            origin,
            vertex: name.to_string(),
            ..Default::default()
        }
    }
}

/// An accumulated validation outcome: the context at which a problem was
/// detected, and what went wrong.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub origin: OriginContext,
    pub error: String,
}

impl ResultEntry {
    pub fn new(origin: OriginContext, error: impl Into<String>) -> Self {
        Self {
            origin,
            error: error.into(),
        }
    }
}

impl fmt::Display for ResultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {} vertex {}: {}",
            self.origin.fow,
            self.origin.root_vertex,
            self.origin.operation,
            self.origin.vertex,
            self.error
        )
    }
}

/// Shared result accumulator.
///
/// Phases collect every problem they encounter instead of stopping at the
/// first one. The lock keeps accumulation valid under callback fan-out even
/// though the current walker is sequential.
#[derive(Debug, Default)]
pub struct Results {
    inner: Mutex<Vec<ResultEntry>>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: ResultEntry) {
        self.inner.lock().push(entry);
    }

    pub fn into_vec(self) -> Vec<ResultEntry> {
        self.inner.into_inner()
    }
}
