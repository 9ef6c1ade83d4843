//! Populate phase: structural pre-validation.
//!
//! Confirms that everything the resolve and connect phases will look up was
//! registered during init: a scoped graph for every visited element and a
//! vertex for the element itself. No edges are drawn here.

use reflow_core::{ControllerConfig, Function};

use crate::execctx::ExecutionContext;
use crate::origin::{OriginContext, ResultEntry, Results};
use crate::walker::{ConfigVisitor, Walker};

pub(crate) fn populate(cfg: &ControllerConfig, cec: &ExecutionContext) -> Vec<ResultEntry> {
    let visitor = PopulateVisitor {
        cec,
        results: Results::new(),
    };
    Walker::new(cfg).walk(&visitor);
    visitor.results.into_vec()
}

struct PopulateVisitor<'a> {
    cec: &'a ExecutionContext,
    results: Results,
}

impl ConfigVisitor for PopulateVisitor<'_> {
    fn record(&self, result: ResultEntry) {
        self.results.record(result);
    }

    fn function(&self, oc: &OriginContext, _function: &Function) {
        match self.cec.dag(oc) {
            Some(dag) if dag.has_vertex(&oc.vertex) => {}
            Some(_) => self.results.record(ResultEntry::new(
                oc.clone(),
                format!("vertex {} is not registered in its graph", oc.vertex),
            )),
            None => self.results.record(ResultEntry::new(
                oc.clone(),
                format!("no graph registered for root {}", oc.root_vertex),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::{FunctionElement, Pipeline, ResourceEntry};
    use serde_json::json;

    fn config_with_task() -> ControllerConfig {
        let mut cfg = ControllerConfig::default();
        cfg.fors.insert(
            "thing".to_string(),
            ResourceEntry {
                resource: json!({"apiVersion": "example.com/v1", "kind": "Thing"}),
                apply_pipeline_ref: "p".to_string(),
                ..Default::default()
            },
        );
        let mut pipeline = Pipeline {
            name: "p".to_string(),
            ..Default::default()
        };
        pipeline
            .tasks
            .insert("render".to_string(), Some(FunctionElement::default()));
        cfg.pipelines.push(pipeline);
        cfg
    }

    #[test]
    fn test_populate_passes_after_init() {
        let cfg = config_with_task();
        let (cec, _gvar, results) = crate::init::init(&cfg);
        assert!(results.is_empty());

        let results = populate(&cfg, &cec);
        assert!(results.is_empty(), "unexpected results: {results:?}");
    }

    #[test]
    fn test_populate_flags_missing_graph() {
        let cfg = config_with_task();
        // an execution context that never saw init
        let cec = ExecutionContext::new("empty");

        let results = populate(&cfg, &cec);
        assert!(!results.is_empty());
        assert!(results[0].error.contains("no graph registered"));
    }
}
