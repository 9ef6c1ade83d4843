//! Resolve phase: reference existence checking.
//!
//! Parses every reference-bearing string in the configuration and verifies
//! each wireable `$name` against the locally visible variables and the
//! global registry scope of the current root. Explicit `dependsOn` names are
//! checked against the current graph. Nothing is connected yet; every
//! unresolved name is collected as its own result.

use reflow_core::{Block, ControllerConfig, Function};

use crate::execctx::ExecutionContext;
use crate::origin::{OriginContext, ResultEntry, Results};
use crate::reference::parse_references;
use crate::registry::{FowEntry, GlobalVariables};
use crate::walker::{ConfigVisitor, Walker};

pub(crate) fn resolve(
    cfg: &ControllerConfig,
    cec: &ExecutionContext,
    gvar: &GlobalVariables,
) -> Vec<ResultEntry> {
    let visitor = ResolveVisitor {
        cec,
        gvar,
        results: Results::new(),
    };
    Walker::new(cfg).walk(&visitor);
    visitor.results.into_vec()
}

struct ResolveVisitor<'a> {
    cec: &'a ExecutionContext,
    gvar: &'a GlobalVariables,
    results: Results,
}

impl ResolveVisitor<'_> {
    fn resolve_refs(&self, oc: &OriginContext, s: &str) {
        for reference in parse_references(s) {
            if !reference.is_wireable() {
                continue;
            }
            if oc.local_vars.contains_key(&reference.name) {
                continue;
            }
            if !self.gvar.exists(&FowEntry::from(oc), &reference.name) {
                self.results.record(ResultEntry::new(
                    oc.clone(),
                    format!("cannot resolve ${}", reference.name),
                ));
            }
        }
    }

    fn resolve_block(&self, oc: &OriginContext, block: &Block) {
        if let Some(range) = &block.range {
            self.resolve_refs(oc, &range.value);
            if !range.block.is_empty() {
                self.resolve_block(oc, &range.block);
            }
        }
        if let Some(condition) = &block.condition {
            self.resolve_refs(oc, &condition.expression);
            if !condition.block.is_empty() {
                self.resolve_block(oc, &condition.block);
            }
        }
    }

    fn resolve_depends_on(&self, oc: &OriginContext, names: &[String]) {
        let dag = oc
            .gvk
            .as_ref()
            .and_then(|gvk| self.cec.dag_ctx(oc.fow, gvk, oc.operation))
            .map(|ctx| &ctx.dag);
        let Some(dag) = dag else {
            self.results.record(ResultEntry::new(
                oc.clone(),
                format!("no graph registered for root {}", oc.root_vertex),
            ));
            return;
        };
        for name in names {
            if !dag.has_vertex(name) {
                self.results.record(ResultEntry::new(
                    oc.clone(),
                    format!("vertex in dependsOn does not exist: {name}"),
                ));
            }
        }
    }
}

impl ConfigVisitor for ResolveVisitor<'_> {
    fn record(&self, result: ResultEntry) {
        self.results.record(result);
    }

    fn function(&self, oc: &OriginContext, function: &Function) {
        for (local_var, expression) in &function.vars {
            let mut oc = oc.clone();
            oc.local_var = local_var.clone();
            self.resolve_refs(&oc, expression);
        }

        if function.has_block() {
            self.resolve_block(oc, &function.block);
        }

        if let Some(selector) = &function.input.selector {
            for (key, value) in &selector.match_labels {
                self.resolve_refs(oc, key);
                self.resolve_refs(oc, value);
            }
        }
        if !function.input.key.is_empty() {
            self.resolve_refs(oc, &function.input.key);
        }
        if !function.input.value.is_empty() {
            self.resolve_refs(oc, &function.input.value);
        }
        if !function.input.expression.is_empty() {
            self.resolve_refs(oc, &function.input.expression);
        }
        for value in function.input.generic_input.values() {
            self.resolve_refs(oc, value);
        }

        if !function.depends_on.is_empty() {
            self.resolve_depends_on(oc, &function.depends_on);
        }
    }
}
