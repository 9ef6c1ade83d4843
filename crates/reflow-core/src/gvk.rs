//! Group/version/kind resource identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// Canonical identity of an API resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Resolve the group/version/kind identity of a raw resource payload.
///
/// The payload is the embedded resource document as it appears in the
/// configuration (an `apiVersion`/`kind` header plus arbitrary content).
/// Failures are expected configuration-validation outcomes; callers record
/// them as results rather than propagating them as fatal.
pub fn resolve_gvk(raw: &Value) -> Result<Gvk> {
    let api_version = raw
        .get("apiVersion")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidResource("missing apiVersion".to_string()))?;
    let kind = raw
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidResource("missing kind".to_string()))?;

    if kind.is_empty() {
        return Err(Error::InvalidResource("empty kind".to_string()));
    }

    let (group, version) = match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        // core-group resources carry a bare version
        None => ("", api_version),
    };
    if version.is_empty() {
        return Err(Error::InvalidResource(format!(
            "invalid apiVersion: {api_version}"
        )));
    }

    Ok(Gvk::new(group, version, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_grouped_resource() {
        let raw = json!({"apiVersion": "topo.example.com/v1alpha1", "kind": "Topology"});
        let gvk = resolve_gvk(&raw).unwrap();
        assert_eq!(gvk, Gvk::new("topo.example.com", "v1alpha1", "Topology"));
        assert_eq!(gvk.to_string(), "topo.example.com/v1alpha1/Topology");
    }

    #[test]
    fn test_resolve_core_group_resource() {
        let raw = json!({"apiVersion": "v1", "kind": "ConfigMap"});
        let gvk = resolve_gvk(&raw).unwrap();
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.to_string(), "v1/ConfigMap");
    }

    #[test]
    fn test_resolve_missing_header() {
        let raw = json!({"metadata": {"name": "x"}});
        assert!(resolve_gvk(&raw).is_err());

        let raw = json!({"apiVersion": "v1"});
        assert!(resolve_gvk(&raw).is_err());
    }
}
