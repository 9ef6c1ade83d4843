//! Inventory queries over a configuration.
//!
//! Reuses the phase walker to answer two questions the deployment side asks
//! before anything runs: which resource kinds the controller touches, and
//! which container images it needs pulled.

use parking_lot::Mutex;
use reflow_core::{
    ControllerConfig, Function, FunctionKind, Gvk, ResourceEntry, resolve_gvk,
};

use crate::origin::{FowKind, OriginContext, ResultEntry, Results};
use crate::walker::{ConfigVisitor, Walker};

/// A container image referenced by the configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    pub kind: ImageKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    /// Runs as a pipeline step.
    Function,
    /// Runs as a long-lived service.
    Service,
}

/// Every distinct resource kind the configuration touches: the for/own/watch
/// declarations, embedded input resources, and externally visible outputs.
pub fn external_resources(cfg: &ControllerConfig) -> (Vec<Gvk>, Vec<ResultEntry>) {
    let visitor = ExternalResources {
        resources: Mutex::new(Vec::new()),
        results: Results::new(),
    };
    Walker::new(cfg).walk(&visitor);
    (visitor.resources.into_inner(), visitor.results.into_vec())
}

struct ExternalResources {
    resources: Mutex<Vec<Gvk>>,
    results: Results,
}

impl ExternalResources {
    fn add(&self, gvk: Gvk) {
        let mut resources = self.resources.lock();
        if !resources.contains(&gvk) {
            resources.push(gvk);
        }
    }

    fn add_from_function(&self, oc: &OriginContext, function: &Function) {
        if let Some(resource) = &function.input.resource {
            match resolve_gvk(resource) {
                Ok(gvk) => self.add(gvk),
                Err(e) => self
                    .results
                    .record(ResultEntry::new(oc.clone(), e.to_string())),
            }
        }
        for output in function.outputs.values() {
            if output.internal {
                continue;
            }
            if let Some(resource) = &output.resource {
                match resolve_gvk(resource) {
                    Ok(gvk) => self.add(gvk),
                    Err(e) => self
                        .results
                        .record(ResultEntry::new(oc.clone(), e.to_string())),
                }
            }
        }
    }
}

impl ConfigVisitor for ExternalResources {
    fn record(&self, result: ResultEntry) {
        self.results.record(result);
    }

    fn resource(&self, _oc: &OriginContext, entry: &ResourceEntry) {
        // identity failures are recorded by the walker
        if let Ok(gvk) = resolve_gvk(&entry.resource) {
            self.add(gvk);
        }
    }

    fn function(&self, oc: &OriginContext, function: &Function) {
        self.add_from_function(oc, function);
    }

    fn service(&self, oc: &OriginContext, function: &Function) {
        self.add_from_function(oc, function);
    }
}

/// Every distinct container image the configuration runs, deduplicated by
/// name. Only container-typed functions carry an image.
pub fn images(cfg: &ControllerConfig) -> Vec<Image> {
    let visitor = Images {
        images: Mutex::new(Vec::new()),
    };
    Walker::new(cfg).walk(&visitor);
    visitor.images.into_inner()
}

struct Images {
    images: Mutex<Vec<Image>>,
}

impl Images {
    fn add(&self, oc: &OriginContext, function: &Function) {
        if function.kind != FunctionKind::Container {
            return;
        }
        let kind = if oc.fow == FowKind::Service {
            ImageKind::Service
        } else {
            ImageKind::Function
        };
        let mut images = self.images.lock();
        if !images.iter().any(|image| image.name == function.image) {
            images.push(Image {
                name: function.image.clone(),
                kind,
            });
        }
    }
}

impl ConfigVisitor for Images {
    fn function(&self, oc: &OriginContext, function: &Function) {
        self.add(oc, function);
    }

    fn service(&self, oc: &OriginContext, function: &Function) {
        self.add(oc, function);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::{FunctionElement, Output, Pipeline};
    use serde_json::json;

    fn config() -> ControllerConfig {
        let mut cfg = ControllerConfig::default();
        cfg.fors.insert(
            "thing".to_string(),
            ResourceEntry {
                resource: json!({"apiVersion": "example.com/v1", "kind": "Thing"}),
                apply_pipeline_ref: "p".to_string(),
                ..Default::default()
            },
        );
        cfg.pipelines.push(Pipeline {
            name: "p".to_string(),
            ..Default::default()
        });
        cfg
    }

    #[test]
    fn test_external_resources_dedup() {
        let mut cfg = config();
        cfg.own.insert(
            "copy".to_string(),
            ResourceEntry {
                resource: json!({"apiVersion": "example.com/v1", "kind": "Thing"}),
                ..Default::default()
            },
        );

        let mut element = FunctionElement::default();
        element.function.input.resource = Some(json!({"apiVersion": "v1", "kind": "ConfigMap"}));
        element.function.outputs.insert(
            "cm".to_string(),
            Output {
                internal: false,
                resource: Some(json!({"apiVersion": "v1", "kind": "ConfigMap"})),
            },
        );
        element.function.outputs.insert(
            "scratch".to_string(),
            Output {
                internal: true,
                resource: Some(json!({"apiVersion": "v1", "kind": "Secret"})),
            },
        );
        cfg.pipelines[0]
            .tasks
            .insert("render".to_string(), Some(element));

        let (resources, results) = external_resources(&cfg);
        assert!(results.is_empty(), "unexpected results: {results:?}");
        // Thing once despite two declarations, ConfigMap once despite two
        // mentions, internal Secret excluded
        assert_eq!(resources.len(), 2);
        assert!(resources.contains(&Gvk::new("example.com", "v1", "Thing")));
        assert!(resources.contains(&Gvk::new("", "v1", "ConfigMap")));
    }

    #[test]
    fn test_external_resources_records_bad_identity() {
        let mut cfg = config();
        let mut element = FunctionElement::default();
        element.function.input.resource = Some(json!({"metadata": {}}));
        cfg.pipelines[0]
            .tasks
            .insert("render".to_string(), Some(element));

        let (_, results) = external_resources(&cfg);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].origin.vertex, "render");
    }

    #[test]
    fn test_images_dedup_and_kinds() {
        let mut cfg = config();
        let mut task = FunctionElement::default();
        task.function.image = "registry.example.com/render:v1".to_string();
        let mut again = FunctionElement::default();
        again.function.image = "registry.example.com/render:v1".to_string();
        let mut templated = FunctionElement::default();
        templated.function.kind = FunctionKind::GoTemplate;
        templated.function.image = "ignored".to_string();
        cfg.pipelines[0].tasks.insert("a".to_string(), Some(task));
        cfg.pipelines[0].tasks.insert("b".to_string(), Some(again));
        cfg.pipelines[0]
            .tasks
            .insert("c".to_string(), Some(templated));

        let mut svc = Function::default();
        svc.image = "registry.example.com/collector:v1".to_string();
        cfg.services.insert("collector".to_string(), svc);

        let mut images = images(&cfg);
        images.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "registry.example.com/collector:v1");
        assert_eq!(images[0].kind, ImageKind::Service);
        assert_eq!(images[1].name, "registry.example.com/render:v1");
        assert_eq!(images[1].kind, ImageKind::Function);
    }
}
