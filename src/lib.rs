//! Webstack - parameter resolution and resource catalogs for a web application stack.
//!
//! This library provides the core of the `webstack` CLI: option
//! declarations, precedence resolution of parameters and node facts, and
//! composition of the resource catalog handed to external collaborators.

pub mod catalog;
pub mod cli;
pub mod collaborators;
pub mod commands;
pub mod config;

/// Library-level error type for Webstack operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse KDL in {path}: {message}")]
    Kdl { path: String, message: String },

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Type mismatch for option '{option}': expected {expected}, found {found}")]
    TypeMismatch {
        option: String,
        expected: String,
        found: String,
    },

    #[error("Ambiguous value for option '{option}' from {origin}: cannot tell unset from empty")]
    AmbiguousAbsence { option: String, origin: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

/// Result type alias for Webstack operations.
pub type Result<T> = std::result::Result<T, Error>;
