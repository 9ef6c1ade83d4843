//! Controller configuration model.
//!
//! A controller configuration declares the resources a controller acts on
//! (`for`), owns (`own`) or watches (`watch`), standalone `services`, and the
//! `pipelines` of variables and tasks that run against those resources. Task
//! pipelines may open a single level of nested `range`/`condition` blocks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;
use crate::gvk::{Gvk, resolve_gvk};

/// A complete controller configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller name.
    #[serde(default)]
    pub name: String,
    /// Resources this controller reconciles; the anchor of the compile.
    #[serde(default, rename = "for")]
    pub fors: HashMap<String, ResourceEntry>,
    /// Resources this controller creates and owns.
    #[serde(default)]
    pub own: HashMap<String, ResourceEntry>,
    /// Resources this controller watches without owning.
    #[serde(default)]
    pub watch: HashMap<String, ResourceEntry>,
    /// Standalone service functions, outside any resource pipeline.
    #[serde(default)]
    pub services: HashMap<String, Function>,
    /// Named pipelines referenced by the resource declarations.
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

impl ControllerConfig {
    /// Look up a pipeline by name.
    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// The root vertex of the compile: the identifier of a `for` declaration.
    ///
    /// Assumed to run after document validation, which guarantees a `for`
    /// entry exists.
    pub fn root_vertex_name(&self) -> Option<&str> {
        self.fors.keys().next().map(String::as_str)
    }

    pub fn for_gvks(&self) -> Result<Vec<Gvk>> {
        Self::gvk_list(&self.fors)
    }

    pub fn own_gvks(&self) -> Result<Vec<Gvk>> {
        Self::gvk_list(&self.own)
    }

    pub fn watch_gvks(&self) -> Result<Vec<Gvk>> {
        Self::gvk_list(&self.watch)
    }

    fn gvk_list(entries: &HashMap<String, ResourceEntry>) -> Result<Vec<Gvk>> {
        entries.values().map(|e| resolve_gvk(&e.resource)).collect()
    }
}

/// A `for`/`own`/`watch` resource declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Raw resource payload carrying the `apiVersion`/`kind` identity.
    #[serde(default)]
    pub resource: Value,
    /// Pipeline to run when the resource is applied.
    #[serde(default, rename = "applyPipelineRef")]
    pub apply_pipeline_ref: String,
    /// Pipeline to run when the resource is deleted.
    #[serde(default, rename = "deletePipelineRef")]
    pub delete_pipeline_ref: String,
}

/// A named pipeline of variables and tasks.
///
/// Variables are visited before tasks. A `None` element body marks an
/// intentionally empty entry, which the compiler reports distinctly from a
/// misconfigured one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default)]
    pub vars: HashMap<String, Option<FunctionElement>>,
    #[serde(default)]
    pub tasks: HashMap<String, Option<FunctionElement>>,
}

/// What a function element is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// Run a container image.
    #[default]
    Container,
    /// Render a template.
    GoTemplate,
    /// Evaluate a query expression.
    Query,
    /// Open a nested block wrapping child elements.
    Block,
}

/// A pipeline element: a function, optionally wrapping nested child elements
/// when its kind is [`FunctionKind::Block`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionElement {
    #[serde(flatten)]
    pub function: Function,
    /// Child elements of a block. Only one nesting level is permitted.
    #[serde(default, rename = "blockTasks")]
    pub block_tasks: HashMap<String, Option<FunctionElement>>,
}

impl FunctionElement {
    pub fn kind(&self) -> FunctionKind {
        self.function.kind
    }

    /// Whether this element carries nested child elements.
    pub fn has_children(&self) -> bool {
        !self.block_tasks.is_empty()
    }
}

/// The body of a pipeline element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Function {
    #[serde(default, rename = "type")]
    pub kind: FunctionKind,
    /// Local variable bindings, visible to this element only.
    #[serde(default)]
    pub vars: HashMap<String, String>,
    /// Range/condition control construct, present on block elements.
    #[serde(default)]
    pub block: Block,
    #[serde(default)]
    pub input: Input,
    /// Declared outputs, referenceable as variables by sibling elements.
    #[serde(default, rename = "output")]
    pub outputs: HashMap<String, Output>,
    /// Explicit vertex dependencies.
    #[serde(default, rename = "dependsOn")]
    pub depends_on: Vec<String>,
    /// Container image backing the function.
    #[serde(default)]
    pub image: String,
}

impl Function {
    /// Whether this function carries a range or condition body.
    pub fn has_block(&self) -> bool {
        self.block.range.is_some() || self.block.condition.is_some()
    }
}

/// A control construct: a `range` loop or a `condition` branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub range: Option<Box<RangeBlock>>,
    #[serde(default)]
    pub condition: Option<Box<ConditionBlock>>,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && self.condition.is_none()
    }
}

/// A loop over the value a reference expression yields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeBlock {
    /// Expression producing the ranged value; exposes `$KEY`/`$VALUE`/`$INDEX`
    /// to the wrapped elements.
    pub value: String,
    /// Further range/condition layers wrapped inside this one.
    #[serde(flatten)]
    pub block: Block,
}

/// A conditional gate on a boolean expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionBlock {
    pub expression: String,
    /// Further range/condition layers wrapped inside this one.
    #[serde(flatten)]
    pub block: Block,
}

/// Inputs consumed by a function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Input {
    /// Embedded raw resource payload.
    #[serde(default)]
    pub resource: Option<Value>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub expression: String,
    /// Free-form named inputs.
    #[serde(default, rename = "genericInput")]
    pub generic_input: HashMap<String, String>,
    #[serde(default)]
    pub selector: Option<Selector>,
}

/// A label selector over resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default, rename = "matchLabels")]
    pub match_labels: HashMap<String, String>,
}

/// A declared function output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Output {
    /// Internal outputs stay within the pipeline and are not surfaced as
    /// external resources.
    #[serde(default)]
    pub internal: bool,
    /// Raw resource payload the output materializes.
    #[serde(default)]
    pub resource: Option<Value>,
}
