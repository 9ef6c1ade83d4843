//! YAML loading for reflow controller configurations.
//!
//! This crate handles:
//! - Unmarshalling a configuration document into the core model
//! - Document-level syntax validation (declaration cardinality and
//!   identifier uniqueness) before the compiler sees the document

pub mod error;

use std::collections::HashSet;
use std::path::Path;

use reflow_core::ControllerConfig;

pub use error::{ConfigError, ConfigResult};

/// Parse a controller configuration from YAML text and validate it.
pub fn load_config(yaml: &str) -> ConfigResult<ControllerConfig> {
    let cfg: ControllerConfig = serde_yaml::from_str(yaml)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Read and parse a controller configuration file.
pub fn load_config_file(path: impl AsRef<Path>) -> ConfigResult<ControllerConfig> {
    let yaml = std::fs::read_to_string(path)?;
    load_config(&yaml)
}

/// Document-level syntax validation.
///
/// Checks the invariants the compiler assumes: exactly one `for` declaration
/// anchors the compile, declaration identifiers are globally unique across
/// `for`/`own`/`watch`/`services`, and pipeline names are unique.
pub fn validate_config(cfg: &ControllerConfig) -> ConfigResult<()> {
    if cfg.fors.is_empty() {
        return Err(ConfigError::MissingField("for".to_string()));
    }
    if cfg.fors.len() > 1 {
        return Err(ConfigError::InvalidValue {
            field: "for".to_string(),
            message: format!("expected exactly one declaration, got {}", cfg.fors.len()),
        });
    }

    let mut seen = HashSet::new();
    for name in cfg
        .fors
        .keys()
        .chain(cfg.own.keys())
        .chain(cfg.watch.keys())
        .chain(cfg.services.keys())
    {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Duplicate(name.clone()));
        }
    }

    let mut pipelines = HashSet::new();
    for pipeline in &cfg.pipelines {
        if pipeline.name.is_empty() {
            return Err(ConfigError::MissingField("pipeline name".to_string()));
        }
        if !pipelines.insert(pipeline.name.as_str()) {
            return Err(ConfigError::Duplicate(pipeline.name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
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
      render:
        type: gotemplate
        input:
          expression: "$topo.spec.nodes"
"#;

        let cfg = load_config(yaml).unwrap();
        assert_eq!(cfg.name, "topo-controller");
        assert_eq!(cfg.root_vertex_name(), Some("topo"));
        let pipeline = cfg.pipeline("topo-apply").unwrap();
        assert!(pipeline.tasks.contains_key("render"));
    }

    #[test]
    fn test_missing_for_rejected() {
        let yaml = r#"
watch:
  ep:
    resource:
      apiVersion: v1
      kind: Endpoints
"#;
        let err = load_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let yaml = r#"
for:
  topo:
    resource:
      apiVersion: topo.example.com/v1
      kind: Topology
watch:
  topo:
    resource:
      apiVersion: v1
      kind: ConfigMap
"#;
        let err = load_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate(_)));
    }

    #[test]
    fn test_duplicate_pipeline_name_rejected() {
        let yaml = r#"
for:
  topo:
    resource:
      apiVersion: topo.example.com/v1
      kind: Topology
pipelines:
  - name: p
  - name: p
"#;
        let err = load_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate(_)));
    }
}
