// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for Vessel
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A control or status file did not parse to the expected paragraphs
    #[error("Invalid control file at {}: {reason}", path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// A paragraph parsed but is missing a field or carries an unknown value
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A package spec string could not be parsed
    #[error("Invalid package spec: {0}")]
    InvalidSpec(String),

    /// Neither a staged build nor a port exists for the package
    #[error("Could not find package named {0}")]
    NotFound(String),

    /// The caller broke an ordering guarantee the engine relies on
    #[error("Internal consistency failure: {0}")]
    InternalConsistency(String),

    /// Uninstall refused because installed packages still depend on the target
    #[error("Cannot remove package {package}: required by {}", dependents.join(", "))]
    DependentsBlockUninstall {
        package: String,
        dependents: Vec<String>,
    },

    /// A journal update could not be committed
    #[error("Journal error: {0}")]
    Journal(String),
}

/// Result type alias using Vessel's Error type
pub type Result<T> = std::result::Result<T, Error>;
