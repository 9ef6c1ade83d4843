//! Global variable registry.
//!
//! One scope per (root-collection-kind, root-vertex-name) pair, so variable
//! names declared under one resource root never leak into another root's
//! resolution, while cross-task references within a root still resolve.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::origin::{FowKind, OriginContext};

/// Key of one independent variable-resolution scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FowEntry {
    pub fow: FowKind,
    pub root_vertex: String,
}

impl FowEntry {
    pub fn new(fow: FowKind, root_vertex: &str) -> Self {
        Self {
            fow,
            root_vertex: root_vertex.to_string(),
        }
    }
}

impl From<&OriginContext> for FowEntry {
    fn from(oc: &OriginContext) -> Self {
        Self::new(oc.fow, &oc.root_vertex)
    }
}

/// Registration of one declared variable within a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    /// The vertex producing the variable.
    pub vertex: String,
    /// The vertex representing its resolved output.
    pub output_vertex: String,
    /// Nesting depth at which the variable was declared.
    pub block_depth: usize,
    /// Vertex rooting the declaring block, empty at depth 0.
    pub block_vertex: String,
}

impl VariableInfo {
    /// A variable produced at pipeline level by the vertex itself.
    pub fn at_vertex(vertex: &str) -> Self {
        Self {
            vertex: vertex.to_string(),
            output_vertex: vertex.to_string(),
            block_depth: 0,
            block_vertex: String::new(),
        }
    }
}

/// Registry of every referenceable variable, scoped by [`FowEntry`].
///
/// The reader/writer lock admits concurrent recording from traversal
/// callbacks; the current walker is sequential, but the contract is written
/// for fan-out.
#[derive(Debug, Default)]
pub struct GlobalVariables {
    name: String,
    scopes: RwLock<HashMap<FowEntry, HashMap<String, VariableInfo>>>,
}

impl GlobalVariables {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scopes: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ensure a scope exists. Idempotent.
    pub fn add_scope(&self, entry: FowEntry) {
        self.scopes.write().entry(entry).or_default();
    }

    /// Register a variable in its scope, creating the scope on first use.
    ///
    /// A name is unique within its scope. Re-registering the identical
    /// registration is a no-op, which keeps a pipeline shared between the
    /// apply and delete operations legal; registering a conflicting one is an
    /// error.
    pub fn register(&self, entry: &FowEntry, name: &str, info: VariableInfo) -> Result<()> {
        let mut scopes = self.scopes.write();
        let scope = scopes.entry(entry.clone()).or_default();
        match scope.get(name) {
            None => {
                scope.insert(name.to_string(), info);
                Ok(())
            }
            Some(existing) if *existing == info => Ok(()),
            Some(_) => Err(Error::DuplicateVariable(name.to_string())),
        }
    }

    pub fn exists(&self, entry: &FowEntry, name: &str) -> bool {
        self.scopes
            .read()
            .get(entry)
            .is_some_and(|scope| scope.contains_key(name))
    }

    /// Exact-name lookup within a scope.
    pub fn lookup(&self, entry: &FowEntry, name: &str) -> Option<VariableInfo> {
        self.scopes.read().get(entry)?.get(name).cloned()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().len()
    }
}
