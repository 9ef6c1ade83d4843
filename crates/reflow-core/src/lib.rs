//! Core domain types for the reflow controller-pipeline compiler.
//!
//! This crate contains:
//! - The controller configuration model (resources, pipelines, function
//!   elements, nested blocks)
//! - The group/version/kind identifier and the raw-payload resolver
//! - Shared error types

pub mod config;
pub mod error;
pub mod gvk;

pub use config::{
    Block, ConditionBlock, ControllerConfig, Function, FunctionElement, FunctionKind, Input,
    Output, Pipeline, RangeBlock, ResourceEntry, Selector,
};
pub use error::{Error, Result};
pub use gvk::{Gvk, resolve_gvk};
