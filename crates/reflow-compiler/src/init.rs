//! Init phase: graph and scope registration.
//!
//! Walks the configuration once, creating the root graphs and block graphs
//! in the execution context, the variable-registry scopes, and every vertex
//! and variable registration the later phases look up. Structural problems
//! (duplicate roots, illegal nesting, block elements without a body) are
//! collected here.

use parking_lot::Mutex;
use reflow_core::{ControllerConfig, Function, FunctionElement, ResourceEntry};

use crate::dag::VertexContext;
use crate::execctx::ExecutionContext;
use crate::origin::{Origin, OriginContext, ResultEntry, Results};
use crate::registry::{FowEntry, GlobalVariables, VariableInfo};
use crate::walker::{ConfigVisitor, Walker};

pub(crate) fn init(
    cfg: &ControllerConfig,
) -> (ExecutionContext, GlobalVariables, Vec<ResultEntry>) {
    let visitor = InitVisitor {
        cec: Mutex::new(ExecutionContext::new(&cfg.name)),
        gvar: GlobalVariables::new(&cfg.name),
        results: Results::new(),
    };
    Walker::new(cfg).walk(&visitor);

    let InitVisitor { cec, gvar, results } = visitor;
    (cec.into_inner(), gvar, results.into_vec())
}

struct InitVisitor {
    cec: Mutex<ExecutionContext>,
    gvar: GlobalVariables,
    results: Results,
}

impl InitVisitor {
    fn fail(&self, oc: &OriginContext, error: impl ToString) {
        self.results
            .record(ResultEntry::new(oc.clone(), error.to_string()));
    }
}

impl ConfigVisitor for InitVisitor {
    fn record(&self, result: ResultEntry) {
        self.results.record(result);
    }

    fn resource(&self, oc: &OriginContext, _entry: &ResourceEntry) {
        if let Err(e) = self.cec.lock().add(oc) {
            self.fail(oc, e);
        }

        // the root declaration itself is referenceable at depth 0
        let entry = FowEntry::from(oc);
        self.gvar.add_scope(entry.clone());
        if let Err(e) = self
            .gvar
            .register(&entry, &oc.vertex, VariableInfo::at_vertex(&oc.vertex))
        {
            self.fail(oc, e);
        }
    }

    fn service(&self, oc: &OriginContext, _function: &Function) {
        self.gvar.add_scope(FowEntry::from(oc));
    }

    fn block(&self, oc: &OriginContext, element: &FunctionElement) {
        if oc.block_depth >= 1 {
            self.fail(oc, "only one block nesting level is permitted");
        }
        if !element.function.has_block() {
            self.fail(oc, "a block element must carry a range or condition body");
        }
        if element.has_children() {
            if let Err(e) = self.cec.lock().add_block(oc) {
                self.fail(oc, e);
            }
        }
    }

    fn function(&self, oc: &OriginContext, function: &Function) {
        // register the vertex in its graph; the block-opening vertex was
        // already seeded into its block graph by add_block
        {
            let mut cec = self.cec.lock();
            if let Some(dag) = cec.dag_mut(oc) {
                if let Err(e) = dag.add_vertex(VertexContext::new(&oc.vertex, oc.origin)) {
                    self.fail(oc, e);
                }
            }
        }

        // register produced variables in the scope of the current root
        let entry = FowEntry::from(oc);
        let info = VariableInfo {
            vertex: oc.vertex.clone(),
            output_vertex: oc.vertex.clone(),
            block_depth: oc.block_depth,
            block_vertex: oc.block_vertex.clone(),
        };
        match oc.origin {
            Origin::Variable => {
                if let Err(e) = self.gvar.register(&entry, &oc.vertex, info) {
                    self.fail(oc, e);
                }
            }
            Origin::Task => {
                for output in function.outputs.keys() {
                    if let Err(e) = self.gvar.register(&entry, output, info.clone()) {
                        self.fail(oc, e);
                    }
                }
            }
            Origin::Fow | Origin::Service => {}
        }
    }
}
