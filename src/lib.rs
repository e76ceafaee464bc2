// src/lib.rs

//! Vessel Package Manager
//!
//! Transactional core of a triplet-aware package manager: a durable record of
//! which packages are installed for which target configurations, and the
//! install/remove lifecycle that keeps that record in step with the disk.
//!
//! # Architecture
//!
//! - Journal-first: every status change is committed as a small update file
//!   before it is considered done, then compacted into one status file on load
//! - Listfiles: each installed package owns a manifest of the paths it created
//! - Triplets: a package identity is a name plus a target configuration
//! - Dependency gating: installs and removals are refused when they would
//!   leave a dependency unsatisfied

pub mod control;
pub mod db;
mod error;
pub mod filesystem;
pub mod install;
pub mod packages;
pub mod paths;
pub mod resolver;
pub mod verify;

pub use error::{Error, Result};
pub use paths::InstallationPaths;
