// src/packages/mod.rs

//! Package records for Vessel
//!
//! This module provides the typed records stored in control and status
//! files. Each record kind implements `ControlParagraph`.

pub mod binary;
pub mod source;
pub mod spec;
pub mod status;

pub use binary::BinaryParagraph;
pub use source::{filter_dependencies, Dependency, SourceParagraph};
pub use spec::{PackageSpec, Triplet};
pub use status::{InstallState, StatusParagraph, Want};
