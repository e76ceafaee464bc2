// src/install.rs

//! Install and remove state machines
//!
//! ```text
//! install: NotInstalled -> HalfInstalled (want install) -> Installed
//! remove:  Installed    -> HalfInstalled (want purge)   -> NotInstalled
//! ```
//!
//! Each arrow is one journal write followed by an in-memory insert. The
//! half-installed write always happens before the filesystem is touched, so
//! an interrupted operation is visible in the database after a restart.

use crate::db::{Journal, StatusDatabase};
use crate::error::{Error, Result};
use crate::filesystem::{self, InstallReport, RemovalReport};
use crate::packages::{BinaryParagraph, InstallState, PackageSpec, StatusParagraph, Want};
use crate::paths::InstallationPaths;
use tracing::info;

/// Install a staged package whose dependencies are already installed
///
/// Every dependency must resolve to an installed record for the same
/// triplet; the caller is expected to install in dependency order, so a
/// violation is an `InternalConsistency` error and nothing is changed.
pub fn install_package(
    paths: &InstallationPaths,
    journal: &mut Journal,
    binary: &BinaryParagraph,
    db: &mut StatusDatabase,
) -> Result<InstallReport> {
    let triplet = binary.spec.triplet();
    for dep in &binary.depends {
        if db.find_installed(dep, triplet).is_none() {
            return Err(Error::InternalConsistency(format!(
                "{} depends on {}:{}, which is not installed",
                binary.spec, dep, triplet
            )));
        }
    }

    let package_dir = paths.package_dir(&binary.spec);
    if !package_dir.is_dir() {
        return Err(Error::NotFound(format!(
            "{} (no staged build at {})",
            binary.spec,
            package_dir.display()
        )));
    }

    let mut record = StatusParagraph::new(binary.clone(), Want::Install, InstallState::HalfInstalled);
    journal.write_update(&record)?;
    db.insert(record.clone());

    let report = filesystem::install_and_write_listfile(paths, binary)?;

    record.state = InstallState::Installed;
    journal.write_update(&record)?;
    db.insert(record);

    info!(
        "Installed {} ({} entries, {} error(s))",
        binary.spec,
        report.entries,
        report.errors.len()
    );
    Ok(report)
}

/// Decision taken before removing a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeinstallPlan {
    /// Nothing to do
    NotInstalled,
    /// Installed packages on the same triplet still depend on it
    Blocked(Vec<PackageSpec>),
    /// Safe to remove; carries the current record
    Proceed(StatusParagraph),
}

/// Decide whether `spec` can be removed, without side effects
pub fn plan_deinstall(spec: &PackageSpec, db: &StatusDatabase) -> DeinstallPlan {
    let record = match db.find(spec) {
        Some(record) if record.state != InstallState::NotInstalled => record,
        _ => return DeinstallPlan::NotInstalled,
    };

    let dependents: Vec<PackageSpec> = db
        .iter()
        .filter(|other| other.package.spec != *spec)
        .filter(|other| other.want == Want::Install)
        .filter(|other| other.package.spec.triplet() == spec.triplet())
        .filter(|other| other.package.depends_on(spec.name()))
        .map(|other| other.package.spec.clone())
        .collect();

    if dependents.is_empty() {
        DeinstallPlan::Proceed(record.clone())
    } else {
        DeinstallPlan::Blocked(dependents)
    }
}

/// Result of a successful remove request
#[derive(Debug, Clone)]
pub enum DeinstallOutcome {
    /// The package was absent or already removed
    NotInstalled,
    Removed(RemovalReport),
}

fn blocked_error(spec: &PackageSpec, dependents: &[PackageSpec]) -> Error {
    Error::DependentsBlockUninstall {
        package: spec.to_string(),
        dependents: dependents.iter().map(ToString::to_string).collect(),
    }
}

/// Remove an installed package and every path its listfile names
///
/// Fails with `DependentsBlockUninstall`, leaving the database and files
/// untouched, when other packages still depend on it.
pub fn deinstall_package(
    paths: &InstallationPaths,
    journal: &mut Journal,
    spec: &PackageSpec,
    db: &mut StatusDatabase,
) -> Result<DeinstallOutcome> {
    let mut record = match plan_deinstall(spec, db) {
        DeinstallPlan::NotInstalled => {
            info!("Package {} is not installed", spec);
            return Ok(DeinstallOutcome::NotInstalled);
        }
        DeinstallPlan::Blocked(dependents) => return Err(blocked_error(spec, &dependents)),
        DeinstallPlan::Proceed(record) => record,
    };

    record.want = Want::Purge;
    record.state = InstallState::HalfInstalled;
    journal.write_update(&record)?;
    db.insert(record.clone());

    let report = filesystem::remove_listed_files(paths, spec)?;

    record.state = InstallState::NotInstalled;
    journal.write_update(&record)?;
    db.insert(record);

    info!("Package {} was successfully removed", spec);
    Ok(DeinstallOutcome::Removed(report))
}

/// Order in which `specs` can be removed, dependents first
///
/// Works on a scratch copy of the database. Dependents named in `specs` do
/// not block; any other dependent fails the whole request.
pub fn plan_removal_order(specs: &[PackageSpec], db: &StatusDatabase) -> Result<Vec<PackageSpec>> {
    for spec in specs {
        if let DeinstallPlan::Blocked(dependents) = plan_deinstall(spec, db) {
            let outside: Vec<PackageSpec> =
                dependents.into_iter().filter(|d| !specs.contains(d)).collect();
            if !outside.is_empty() {
                return Err(blocked_error(spec, &outside));
            }
        }
    }

    let mut scratch = db.clone();
    let mut pending: Vec<&PackageSpec> = specs.iter().collect();
    let mut order = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let next = pending
            .iter()
            .enumerate()
            .find_map(|(i, spec)| match plan_deinstall(spec, &scratch) {
                DeinstallPlan::Blocked(_) => None,
                DeinstallPlan::NotInstalled => Some((i, None)),
                DeinstallPlan::Proceed(record) => Some((i, Some(record))),
            });
        let Some((index, record)) = next else {
            let names: Vec<String> = pending.iter().map(ToString::to_string).collect();
            return Err(Error::InternalConsistency(format!(
                "circular dependencies between {}",
                names.join(", ")
            )));
        };

        if let Some(mut record) = record {
            record.want = Want::Purge;
            record.state = InstallState::NotInstalled;
            scratch.insert(record);
        }
        order.push(pending.remove(index).clone());
    }
    Ok(order)
}

/// Remove several packages as one request
///
/// The whole request is planned before anything changes, so a blocked
/// package leaves every other package in the request installed.
pub fn deinstall_packages(
    paths: &InstallationPaths,
    journal: &mut Journal,
    specs: &[PackageSpec],
    db: &mut StatusDatabase,
) -> Result<Vec<(PackageSpec, DeinstallOutcome)>> {
    let order = plan_removal_order(specs, db)?;

    let mut outcomes = Vec::with_capacity(order.len());
    for spec in order {
        let outcome = deinstall_package(paths, journal, &spec, db)?;
        outcomes.push((spec, outcome));
    }
    Ok(outcomes)
}
