//! Generic configuration traversal.
//!
//! One walker serves every compile phase: each phase implements
//! [`ConfigVisitor`] and reacts only to the node kinds it cares about, so all
//! phases see an identical node ordering and identical [`OriginContext`]
//! shapes. The walker resolves resource identity itself and records failures
//! through the visitor.

use reflow_core::{
    ControllerConfig, Function, FunctionElement, FunctionKind, Pipeline, ResourceEntry,
    resolve_gvk,
};

use crate::origin::{FowKind, Operation, Origin, OriginContext, ResultEntry};

/// Visitor over configuration nodes. Every method defaults to a no-op, so a
/// phase only implements the hooks it needs.
///
/// Methods take `&self`: a visitor that accumulates state does so behind its
/// own locks, which keeps parallel visitation of independent resource roots a
/// legal future evolution.
pub trait ConfigVisitor {
    /// A problem detected during traversal (identity resolution, structure).
    fn record(&self, _result: ResultEntry) {}

    fn config_pre(&self, _cfg: &ControllerConfig) {}
    fn config_post(&self, _cfg: &ControllerConfig) {}

    /// A for/own/watch resource declaration.
    fn resource(&self, _oc: &OriginContext, _entry: &ResourceEntry) {}
    /// A declaration whose pipeline reference resolves to no pipeline.
    fn empty_pipeline(&self, _oc: &OriginContext, _entry: &ResourceEntry) {}

    fn pipeline_pre(&self, _oc: &OriginContext, _pipeline: &Pipeline) {}
    fn pipeline_post(&self, _oc: &OriginContext, _pipeline: &Pipeline) {}

    /// A block element, fired before its wrapped function and children.
    fn block(&self, _oc: &OriginContext, _element: &FunctionElement) {}
    /// A variable binding or task function.
    fn function(&self, _oc: &OriginContext, _function: &Function) {}
    /// An element with no body: intentionally absent, not misconfigured.
    fn empty_element(&self, _oc: &OriginContext) {}

    /// A standalone service function.
    fn service(&self, _oc: &OriginContext, _function: &Function) {}
}

/// Walks a configuration tree, dispatching to a [`ConfigVisitor`].
pub struct Walker<'a> {
    cfg: &'a ControllerConfig,
}

impl<'a> Walker<'a> {
    pub fn new(cfg: &'a ControllerConfig) -> Self {
        Self { cfg }
    }

    /// Traverse the whole configuration.
    ///
    /// Within one declaration the order is deterministic: the resource, its
    /// apply pipeline, then its delete pipeline, variables before tasks. The
    /// set of declarations itself is unordered; identifiers are globally
    /// unique, so phases must not depend on inter-declaration order.
    pub fn walk(&self, visitor: &dyn ConfigVisitor) {
        visitor.config_pre(self.cfg);

        for (name, entry) in &self.cfg.fors {
            self.walk_resource(visitor, FowKind::For, name, entry);
        }
        for (name, entry) in &self.cfg.own {
            self.walk_resource(visitor, FowKind::Own, name, entry);
        }
        for (name, entry) in &self.cfg.watch {
            self.walk_resource(visitor, FowKind::Watch, name, entry);
        }

        for (name, function) in &self.cfg.services {
            let oc = OriginContext::root(FowKind::Service, name, Origin::Service);
            visitor.service(&oc, function);
        }

        visitor.config_post(self.cfg);
    }

    fn walk_resource(
        &self,
        visitor: &dyn ConfigVisitor,
        fow: FowKind,
        name: &str,
        entry: &ResourceEntry,
    ) {
        let mut oc = OriginContext::root(fow, name, Origin::Fow);
        match resolve_gvk(&entry.resource) {
            Ok(gvk) => oc.gvk = Some(gvk),
            Err(e) => visitor.record(ResultEntry::new(oc.clone(), e.to_string())),
        }
        visitor.resource(&oc, entry);

        let refs = [
            (Operation::Apply, entry.apply_pipeline_ref.as_str()),
            (Operation::Delete, entry.delete_pipeline_ref.as_str()),
        ];
        for (operation, pipeline_ref) in refs {
            let mut oc = oc.clone();
            oc.operation = operation;
            match self.cfg.pipeline(pipeline_ref) {
                Some(pipeline) => self.walk_pipeline(visitor, &oc, pipeline),
                None => visitor.empty_pipeline(&oc, entry),
            }
        }
    }

    fn walk_pipeline(&self, visitor: &dyn ConfigVisitor, oc: &OriginContext, pipeline: &Pipeline) {
        let mut oc = oc.clone();
        oc.pipeline = pipeline.name.clone();
        visitor.pipeline_pre(&oc, pipeline);

        // variables before tasks
        for (vertex, element) in &pipeline.vars {
            let oc = Self::element_context(&oc, Origin::Variable, vertex, element.as_ref());
            self.walk_element(visitor, oc, element.as_ref());
        }
        for (vertex, element) in &pipeline.tasks {
            let oc = Self::element_context(&oc, Origin::Task, vertex, element.as_ref());
            self.walk_element(visitor, oc, element.as_ref());
        }

        visitor.pipeline_post(&oc, pipeline);
    }

    fn element_context(
        oc: &OriginContext,
        origin: Origin,
        vertex: &str,
        element: Option<&FunctionElement>,
    ) -> OriginContext {
        let mut oc = oc.clone();
        oc.origin = origin;
        oc.vertex = vertex.to_string();
        if let Some(element) = element {
            oc.local_vars = element.function.vars.clone();
        }
        oc
    }

    fn walk_element(
        &self,
        visitor: &dyn ConfigVisitor,
        oc: OriginContext,
        element: Option<&FunctionElement>,
    ) {
        let Some(element) = element else {
            visitor.empty_element(&oc);
            return;
        };

        if element.kind() == FunctionKind::Block {
            visitor.block(&oc, element);

            // the wrapped function is visited like a regular one
            let mut fn_oc = oc.clone();
            fn_oc.block = true;
            visitor.function(&fn_oc, &element.function);

            for (vertex, child) in &element.block_tasks {
                // children inherit the block's locally visible variables
                let mut child_oc = oc.clone();
                child_oc.block = true;
                child_oc.block_depth = oc.block_depth + 1;
                child_oc.block_vertex = oc.vertex.clone();
                child_oc.vertex = vertex.to_string();
                self.walk_element(visitor, child_oc, child.as_ref());
            }
        } else {
            visitor.function(&oc, &element.function);
        }
    }
}
