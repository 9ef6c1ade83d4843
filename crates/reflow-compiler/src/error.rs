//! Structural errors raised by the graph store and variable registry.
//!
//! These surface to users as accumulated [`ResultEntry`](crate::origin::ResultEntry)
//! records, never as panics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("vertex already exists: {0}")]
    DuplicateVertex(String),

    #[error("vertex does not exist: {0}")]
    MissingVertex(String),

    #[error("connecting {from} -> {to} would create a cycle")]
    CycleDetected { from: String, to: String },

    #[error("graph already registered for root {0}")]
    DuplicateGraph(String),

    #[error("no graph registered for {0}")]
    MissingGraph(String),

    #[error("block graph already registered under {0}")]
    DuplicateBlock(String),

    #[error("only one block nesting level is permitted, {vertex} sits at depth {depth}")]
    IllegalNesting { vertex: String, depth: usize },

    #[error("variable already declared in this scope: {0}")]
    DuplicateVariable(String),

    #[error("resource identity unresolved for {0}")]
    MissingIdentity(String),
}

pub type Result<T> = std::result::Result<T, Error>;
