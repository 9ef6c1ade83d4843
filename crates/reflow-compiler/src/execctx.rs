//! Per-root execution graph store.
//!
//! One directed graph per (root-collection-kind, resolved identity,
//! operation) triple, plus one block-scoped graph per block-opening vertex.
//! Graphs are built across init and mutated through connect; after transitive
//! reduction they are the artifact handed to the runtime.

use reflow_core::Gvk;
use std::collections::HashMap;

use crate::dag::{Dag, VertexContext};
use crate::error::{Error, Result};
use crate::origin::{FowKind, Operation, Origin, OriginContext};

/// The graphs of one (kind, identity, operation) triple: the root graph and
/// the block graphs keyed by their block-opening vertex.
#[derive(Debug)]
pub struct DagCtx {
    pub root_vertex: String,
    pub dag: Dag,
    pub block_dags: HashMap<String, Dag>,
}

impl DagCtx {
    fn new(root_vertex: &str) -> Result<Self> {
        let mut dag = Dag::new();
        dag.add_vertex(VertexContext::new(root_vertex, Origin::Fow))?;
        Ok(Self {
            root_vertex: root_vertex.to_string(),
            dag,
            block_dags: HashMap::new(),
        })
    }
}

/// Execution graph store for one compile.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    name: String,
    fows: HashMap<FowKind, HashMap<Gvk, HashMap<Operation, DagCtx>>>,
}

impl ExecutionContext {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fows: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register the root graphs for a resource declaration, one per
    /// operation, each seeded with the declaration's root vertex.
    pub fn add(&mut self, oc: &OriginContext) -> Result<()> {
        let gvk = oc
            .gvk
            .clone()
            .ok_or_else(|| Error::MissingIdentity(oc.vertex.clone()))?;

        let by_gvk = self.fows.entry(oc.fow).or_default();
        let by_op = by_gvk.entry(gvk).or_default();
        for operation in [Operation::Apply, Operation::Delete] {
            if by_op.contains_key(&operation) {
                return Err(Error::DuplicateGraph(oc.root_vertex.clone()));
            }
            by_op.insert(operation, DagCtx::new(&oc.root_vertex)?);
        }
        Ok(())
    }

    /// Register a block graph under a block-opening vertex, seeded with that
    /// vertex. The vertex itself sits in the root graph, so its children live
    /// at the single permitted nesting level.
    pub fn add_block(&mut self, oc: &OriginContext) -> Result<()> {
        if oc.block_depth != 0 {
            return Err(Error::IllegalNesting {
                vertex: oc.vertex.clone(),
                depth: oc.block_depth + 1,
            });
        }
        let ctx = self
            .ctx_mut(oc)
            .ok_or_else(|| Error::MissingGraph(oc.root_vertex.clone()))?;
        if ctx.block_dags.contains_key(&oc.vertex) {
            return Err(Error::DuplicateBlock(oc.vertex.clone()));
        }
        let mut dag = Dag::new();
        dag.add_vertex(VertexContext::new(&oc.vertex, oc.origin))?;
        ctx.block_dags.insert(oc.vertex.clone(), dag);
        Ok(())
    }

    /// The graph a context writes into: its block graph inside a block, the
    /// root graph otherwise.
    pub fn dag(&self, oc: &OriginContext) -> Option<&Dag> {
        let ctx = self.ctx(oc)?;
        if oc.block_depth > 0 {
            ctx.block_dags.get(&oc.block_vertex)
        } else {
            Some(&ctx.dag)
        }
    }

    pub fn dag_mut(&mut self, oc: &OriginContext) -> Option<&mut Dag> {
        let ctx = self.ctx_mut(oc)?;
        if oc.block_depth > 0 {
            ctx.block_dags.get_mut(&oc.block_vertex)
        } else {
            Some(&mut ctx.dag)
        }
    }

    pub fn dag_ctx(&self, fow: FowKind, gvk: &Gvk, operation: Operation) -> Option<&DagCtx> {
        self.fows.get(&fow)?.get(gvk)?.get(&operation)
    }

    fn ctx(&self, oc: &OriginContext) -> Option<&DagCtx> {
        self.dag_ctx(oc.fow, oc.gvk.as_ref()?, oc.operation)
    }

    fn ctx_mut(&mut self, oc: &OriginContext) -> Option<&mut DagCtx> {
        self.fows
            .get_mut(&oc.fow)?
            .get_mut(oc.gvk.as_ref()?)?
            .get_mut(&oc.operation)
    }

    /// Number of declarations with registered graphs.
    pub fn root_count(&self) -> usize {
        self.fows.values().map(HashMap::len).sum()
    }

    pub fn contexts(&self) -> impl Iterator<Item = &DagCtx> {
        self.fows
            .values()
            .flat_map(HashMap::values)
            .flat_map(HashMap::values)
    }

    /// Every graph in the store: each root graph and each block graph.
    pub fn dags_mut(&mut self) -> impl Iterator<Item = &mut Dag> {
        self.fows
            .values_mut()
            .flat_map(HashMap::values_mut)
            .flat_map(HashMap::values_mut)
            .flat_map(|ctx| std::iter::once(&mut ctx.dag).chain(ctx.block_dags.values_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_oc() -> OriginContext {
        let mut oc = OriginContext::root(FowKind::For, "topo", Origin::Fow);
        oc.gvk = Some(Gvk::new("example.com", "v1", "Topology"));
        oc
    }

    #[test]
    fn test_add_creates_graph_per_operation() {
        let mut cec = ExecutionContext::new("test");
        let oc = root_oc();
        cec.add(&oc).unwrap();

        assert_eq!(cec.root_count(), 1);
        for operation in [Operation::Apply, Operation::Delete] {
            let ctx = cec
                .dag_ctx(FowKind::For, oc.gvk.as_ref().unwrap(), operation)
                .unwrap();
            assert!(ctx.dag.has_vertex("topo"));
        }
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut cec = ExecutionContext::new("test");
        let oc = root_oc();
        cec.add(&oc).unwrap();
        assert!(matches!(cec.add(&oc), Err(Error::DuplicateGraph(_))));
    }

    #[test]
    fn test_add_requires_identity() {
        let mut cec = ExecutionContext::new("test");
        let mut oc = root_oc();
        oc.gvk = None;
        assert!(matches!(cec.add(&oc), Err(Error::MissingIdentity(_))));
    }

    #[test]
    fn test_block_graph_lookup() {
        let mut cec = ExecutionContext::new("test");
        let root = root_oc();
        cec.add(&root).unwrap();

        let mut block_oc = root.clone();
        block_oc.operation = Operation::Apply;
        block_oc.origin = Origin::Task;
        block_oc.vertex = "loop".to_string();
        cec.add_block(&block_oc).unwrap();

        // inside the block, lookups land on the block graph
        let mut inner = block_oc.clone();
        inner.block_depth = 1;
        inner.block_vertex = "loop".to_string();
        inner.vertex = "inner".to_string();
        let dag = cec.dag(&inner).unwrap();
        assert!(dag.has_vertex("loop"));

        // at depth 0 they land on the root graph
        let dag = cec.dag(&block_oc).unwrap();
        assert!(dag.has_vertex("topo"));
    }

    #[test]
    fn test_nested_block_rejected() {
        let mut cec = ExecutionContext::new("test");
        let root = root_oc();
        cec.add(&root).unwrap();

        let mut nested = root.clone();
        nested.operation = Operation::Apply;
        nested.vertex = "inner-loop".to_string();
        nested.block_depth = 1;
        nested.block_vertex = "loop".to_string();
        assert!(matches!(
            cec.add_block(&nested),
            Err(Error::IllegalNesting { depth: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_block_rejected() {
        let mut cec = ExecutionContext::new("test");
        let root = root_oc();
        cec.add(&root).unwrap();

        let mut block_oc = root.clone();
        block_oc.operation = Operation::Apply;
        block_oc.vertex = "loop".to_string();
        cec.add_block(&block_oc).unwrap();
        assert!(matches!(
            cec.add_block(&block_oc),
            Err(Error::DuplicateBlock(_))
        ));
    }
}
