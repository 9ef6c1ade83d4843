//! Controller configuration compiler.
//!
//! Turns a parsed [`ControllerConfig`] into per-resource, per-operation
//! execution graphs. Compilation runs in four phases over one shared
//! traversal:
//! - init: register graphs, registry scopes, vertices and variables
//! - populate: confirm everything the later phases look up exists
//! - resolve: check every `$name` reference against the registry
//! - connect: draw dependency edges, routed by block depth
//!
//! A failed phase aborts the compile and returns every problem that phase
//! found. Successful compiles end with a transitive reduction of each graph.

pub mod dag;
pub mod error;
pub mod execctx;
pub mod inventory;
pub mod origin;
pub mod reference;
pub mod registry;
pub mod walker;

mod connect;
mod init;
mod populate;
mod resolve;

pub use dag::{Dag, VertexContext};
pub use error::{Error, Result};
pub use execctx::{DagCtx, ExecutionContext};
pub use inventory::{Image, ImageKind, external_resources, images};
pub use origin::{FowKind, Operation, Origin, OriginContext, ResultEntry};
pub use registry::{FowEntry, GlobalVariables, VariableInfo};

use reflow_core::ControllerConfig;
use tracing::info;

/// Compiles a controller configuration into execution graphs.
pub struct Compiler<'a> {
    cfg: &'a ControllerConfig,
}

impl<'a> Compiler<'a> {
    pub fn new(cfg: &'a ControllerConfig) -> Self {
        Self { cfg }
    }

    /// Run all phases. On success the returned execution context holds one
    /// transitively reduced root graph per declaration and operation, plus
    /// the block graphs hanging off block-opening vertices.
    pub fn compile(&self) -> std::result::Result<ExecutionContext, Vec<ResultEntry>> {
        let (mut cec, gvar, results) = init::init(self.cfg);
        if !results.is_empty() {
            info!(config = %self.cfg.name, errors = results.len(), "init failed");
            return Err(results);
        }

        let results = populate::populate(self.cfg, &cec);
        if !results.is_empty() {
            info!(config = %self.cfg.name, errors = results.len(), "populate failed");
            return Err(results);
        }

        let results = resolve::resolve(self.cfg, &cec, &gvar);
        if !results.is_empty() {
            info!(config = %self.cfg.name, errors = results.len(), "resolve failed");
            return Err(results);
        }

        let results;
        (cec, results) = connect::connect(self.cfg, cec, &gvar);
        if !results.is_empty() {
            info!(config = %self.cfg.name, errors = results.len(), "connect failed");
            return Err(results);
        }

        for dag in cec.dags_mut() {
            dag.transitive_reduction();
        }
        info!(config = %self.cfg.name, roots = cec.root_count(), "compiled");
        Ok(cec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::Gvk;

    fn compile(yaml: &str) -> std::result::Result<ExecutionContext, Vec<ResultEntry>> {
        let cfg = reflow_config::load_config(yaml).unwrap();
        Compiler::new(&cfg).compile()
    }

    fn topo_ctx(cec: &ExecutionContext) -> &DagCtx {
        cec.dag_ctx(
            FowKind::For,
            &Gvk::new("topo.example.com", "v1alpha1", "Topology"),
            Operation::Apply,
        )
        .unwrap()
    }

    #[test]
    fn test_compile_end_to_end() {
        let yaml = r#"
name: topo-controller
for:
  topo:
    resource:
      apiVersion: topo.example.com/v1alpha1
      kind: Topology
    applyPipelineRef: topo-apply
pipelines:
  - name: topo-apply
    vars:
      site:
        input:
          expression: "$topo.spec.site"
    tasks:
      render:
        type: gotemplate
        input:
          expression: "$site $topo.metadata.name"
        output:
          rendered:
            internal: true
      publish:
        input:
          expression: "$rendered.data"
"#;
        let cec = compile(yaml).unwrap();
        let ctx = topo_ctx(&cec);

        assert!(ctx.dag.has_edge("topo", "site"));
        assert!(ctx.dag.has_edge("site", "render"));
        assert!(ctx.dag.has_edge("render", "publish"));
        // render depends on topo through site; the direct edge is reduced away
        assert!(!ctx.dag.has_edge("topo", "render"));
        assert!(ctx.dag.has_path("topo", "publish"));
    }

    #[test]
    fn test_compile_block_routing() {
        let yaml = r#"
name: topo-controller
for:
  topo:
    resource:
      apiVersion: topo.example.com/v1alpha1
      kind: Topology
    applyPipelineRef: topo-apply
pipelines:
  - name: topo-apply
    tasks:
      prep:
        output:
          settings:
            internal: true
      gen:
        type: block
        block:
          range:
            value: "$topo.spec.links"
        blockTasks:
          mk:
            input:
              expression: "$settings.mtu $VALUE"
"#;
        let cec = compile(yaml).unwrap();
        let ctx = topo_ctx(&cec);

        // the block root depends on both producers it transitively consumes
        assert!(ctx.dag.has_edge("topo", "gen"));
        assert!(ctx.dag.has_edge("prep", "gen"));
        // inside the block, the consumer hangs off the block root
        assert!(ctx.block_dags["gen"].has_edge("gen", "mk"));
    }

    #[test]
    fn test_compile_unresolved_reference_then_fixed() {
        let broken = r#"
name: topo-controller
for:
  topo:
    resource:
      apiVersion: topo.example.com/v1alpha1
      kind: Topology
    applyPipelineRef: topo-apply
pipelines:
  - name: topo-apply
    tasks:
      render:
        input:
          expression: "$missing.spec"
"#;
        let results = compile(broken).unwrap_err();
        assert_eq!(results.len(), 1);
        assert!(results[0].error.contains("cannot resolve $missing"));

        let fixed = broken.replace("$missing.spec", "$topo.spec");
        assert!(compile(&fixed).is_ok());
    }

    #[test]
    fn test_compile_rejects_double_nesting() {
        let yaml = r#"
name: topo-controller
for:
  topo:
    resource:
      apiVersion: topo.example.com/v1alpha1
      kind: Topology
    applyPipelineRef: topo-apply
pipelines:
  - name: topo-apply
    tasks:
      outer:
        type: block
        block:
          range:
            value: "$topo.spec.links"
        blockTasks:
          inner:
            type: block
            block:
              range:
                value: "$VALUE"
            blockTasks:
              leaf:
                input:
                  expression: "$VALUE"
"#;
        let results = compile(yaml).unwrap_err();
        assert!(
            results
                .iter()
                .any(|r| r.error.contains("only one block nesting level"))
        );
    }
}
