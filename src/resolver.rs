// src/resolver.rs

//! Dependency lookup for packages about to be installed
//!
//! This is not a solver: it reports the dependency names a package declares
//! so the caller can order installs. A staged build is consulted first since
//! its dependencies are already resolved for the triplet; otherwise the port's
//! source control file is filtered against the triplet.

use crate::control::{load_control_file, ControlParagraph};
use crate::db::StatusDatabase;
use crate::error::{Error, Result};
use crate::packages::{filter_dependencies, BinaryParagraph, PackageSpec, SourceParagraph};
use crate::paths::InstallationPaths;
use tracing::debug;

/// Name of the control file inside a staged package or port
pub const CONTROL_FILE: &str = "CONTROL";

/// Read the control file of a staged build, if one exists
pub fn load_binary_paragraph(
    paths: &InstallationPaths,
    spec: &PackageSpec,
) -> Result<Option<BinaryParagraph>> {
    let path = paths.package_dir(spec).join(CONTROL_FILE);
    load_control_file(&path)?
        .map(|p| BinaryParagraph::from_paragraph(&p))
        .transpose()
}

/// Read the control file of a port, if one exists
pub fn load_source_paragraph(
    paths: &InstallationPaths,
    spec: &PackageSpec,
) -> Result<Option<SourceParagraph>> {
    let path = paths.port_dir(spec).join(CONTROL_FILE);
    load_control_file(&path)?
        .map(|p| SourceParagraph::from_paragraph(&p))
        .transpose()
}

/// Declared dependency names of `spec`
///
/// A staged build's dependencies are returned as written. Without a staged
/// build, the port's dependencies are filtered to those that apply to the
/// spec's triplet. Fails with `NotFound` when neither exists.
pub fn unmet_dependencies(paths: &InstallationPaths, spec: &PackageSpec) -> Result<Vec<String>> {
    if let Some(binary) = load_binary_paragraph(paths, spec)? {
        debug!("Using staged build of {} for dependencies", spec);
        return Ok(binary.depends);
    }

    if let Some(source) = load_source_paragraph(paths, spec)? {
        debug!("Using port of {} for dependencies", spec);
        return Ok(filter_dependencies(&source.depends, spec.triplet()));
    }

    Err(Error::NotFound(spec.to_string()))
}

/// Declared dependencies of `spec` that are not yet installed for its triplet
pub fn missing_dependencies(
    paths: &InstallationPaths,
    spec: &PackageSpec,
    db: &StatusDatabase,
) -> Result<Vec<String>> {
    Ok(unmet_dependencies(paths, spec)?
        .into_iter()
        .filter(|dep| db.find_installed(dep, spec.triplet()).is_none())
        .collect())
}
