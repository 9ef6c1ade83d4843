//! Connect phase: edge drawing.
//!
//! Repeats the resolve-phase reference walk, this time wiring dependency
//! edges into the execution graphs and accumulating the consumed reference
//! set on each vertex. Edge routing depends on where the producing variable
//! was declared relative to the referencing vertex:
//!
//! - producer shallower: the referencing vertex hangs off its own block
//!   root, and the block root depends on the producer in the root graph
//! - producer deeper: the producer's block must have collapsed to a single
//!   output first, so the edge targets the producer's block root
//! - equal depth: a direct edge from the producer's output vertex
//!
//! Block containment itself is a dependency, as is every `dependsOn` name.

use parking_lot::Mutex;
use reflow_core::{Block, ControllerConfig, Function};
use std::cmp::Ordering;

use crate::execctx::ExecutionContext;
use crate::origin::{OriginContext, ResultEntry, Results};
use crate::reference::parse_references;
use crate::registry::{FowEntry, GlobalVariables};
use crate::walker::{ConfigVisitor, Walker};

pub(crate) fn connect(
    cfg: &ControllerConfig,
    cec: ExecutionContext,
    gvar: &GlobalVariables,
) -> (ExecutionContext, Vec<ResultEntry>) {
    let visitor = ConnectVisitor {
        cec: Mutex::new(cec),
        gvar,
        results: Results::new(),
    };
    Walker::new(cfg).walk(&visitor);

    let ConnectVisitor { cec, results, .. } = visitor;
    (cec.into_inner(), results.into_vec())
}

struct ConnectVisitor<'a> {
    cec: Mutex<ExecutionContext>,
    gvar: &'a GlobalVariables,
    results: Results,
}

impl ConnectVisitor<'_> {
    fn fail(&self, oc: &OriginContext, error: impl ToString) {
        self.results
            .record(ResultEntry::new(oc.clone(), error.to_string()));
    }

    /// Draw an edge `from -> oc.vertex` in the graph the context writes into.
    fn connect_vertex(&self, oc: &OriginContext, from: &str) {
        let mut cec = self.cec.lock();
        let Some(dag) = cec.dag_mut(oc) else {
            self.fail(oc, format!("no graph registered for root {}", oc.root_vertex));
            return;
        };
        if let Err(e) = dag.connect(from, &oc.vertex) {
            self.fail(oc, e);
        }
    }

    fn connect_refs(&self, oc: &OriginContext, s: &str) {
        for reference in parse_references(s) {
            if !reference.is_wireable() {
                continue;
            }

            {
                let mut cec = self.cec.lock();
                if let Some(dag) = cec.dag_mut(oc) {
                    dag.add_reference(&oc.vertex, &reference.name);
                }
            }
            if oc.local_vars.contains_key(&reference.name) {
                continue;
            }

            let Some(info) = self.gvar.lookup(&FowEntry::from(oc), &reference.name) else {
                self.fail(
                    oc,
                    format!("variable not found in registry: {}", reference.name),
                );
                continue;
            };

            match info.block_depth.cmp(&oc.block_depth) {
                Ordering::Less => {
                    // the reference reaches an ancestor scope: hang the
                    // vertex off its block root, and make the block root
                    // depend on the producer in the root graph
                    self.connect_vertex(oc, &oc.block_vertex);

                    let mut root_oc = oc.clone();
                    root_oc.block_depth = 0;
                    root_oc.block_vertex.clear();
                    let mut cec = self.cec.lock();
                    let Some(root_dag) = cec.dag_mut(&root_oc) else {
                        self.fail(oc, format!("no graph registered for root {}", oc.root_vertex));
                        continue;
                    };
                    if let Err(e) = root_dag.connect(&info.vertex, &oc.block_vertex) {
                        self.fail(oc, e);
                    }
                }
                Ordering::Greater => {
                    // the producer sits inside a block: depend on its root
                    self.connect_vertex(oc, &info.block_vertex);
                }
                Ordering::Equal => {
                    self.connect_vertex(oc, &info.output_vertex);
                }
            }
        }
    }

    fn connect_block(&self, oc: &OriginContext, block: &Block) {
        if let Some(range) = &block.range {
            self.connect_refs(oc, &range.value);
            if !range.block.is_empty() {
                self.connect_block(oc, &range.block);
            }
        }
        if let Some(condition) = &block.condition {
            self.connect_refs(oc, &condition.expression);
            if !condition.block.is_empty() {
                self.connect_block(oc, &condition.block);
            }
        }
    }
}

impl ConfigVisitor for ConnectVisitor<'_> {
    fn record(&self, result: ResultEntry) {
        self.results.record(result);
    }

    fn function(&self, oc: &OriginContext, function: &Function) {
        for (local_var, expression) in &function.vars {
            let mut oc = oc.clone();
            oc.local_var = local_var.clone();
            self.connect_refs(&oc, expression);
        }

        if function.has_block() {
            self.connect_block(oc, &function.block);
        }

        // an embedded raw resource depends on the scope it is rendered in
        if function.input.resource.is_some() {
            let from = if oc.block_depth > 0 {
                oc.block_vertex.clone()
            } else {
                oc.root_vertex.clone()
            };
            if from != oc.vertex {
                self.connect_vertex(oc, &from);
            }
        }
        if !function.input.key.is_empty() {
            self.connect_refs(oc, &function.input.key);
        }
        if !function.input.value.is_empty() {
            self.connect_refs(oc, &function.input.value);
        }
        if !function.input.expression.is_empty() {
            self.connect_refs(oc, &function.input.expression);
        }
        for value in function.input.generic_input.values() {
            self.connect_refs(oc, value);
        }
        if let Some(selector) = &function.input.selector {
            for (key, value) in &selector.match_labels {
                self.connect_refs(oc, key);
                self.connect_refs(oc, value);
            }
        }

        // block containment is itself a dependency
        if oc.block_depth > 0 {
            self.connect_vertex(oc, &oc.block_vertex);
        }

        for name in &function.depends_on {
            self.connect_vertex(oc, name);
        }
    }
}
