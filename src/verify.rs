// src/verify.rs

//! Consistency report between the status database and the listfiles
//!
//! Interrupted installs and removals leave a half-installed record, and
//! possibly a partial listfile, behind. This module finds those states; it
//! never changes anything.

use crate::db::StatusDatabase;
use crate::error::Result;
use crate::filesystem::listed_packages;
use crate::packages::{InstallState, PackageSpec, Want};
use crate::paths::InstallationPaths;
use std::fmt;

/// One inconsistency found by [`verify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// An install or remove was interrupted
    HalfInstalled { spec: PackageSpec, want: Want },
    /// Installed according to the database, but no listfile exists
    MissingListfile(PackageSpec),
    /// A listfile exists for a package the database does not hold
    OrphanListfile(PackageSpec),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::HalfInstalled { spec, want } => write!(
                f,
                "{} is half-installed (interrupted {})",
                spec,
                match want {
                    Want::Install => "install",
                    Want::Purge => "removal",
                }
            ),
            Finding::MissingListfile(spec) => write!(f, "{} is installed but has no listfile", spec),
            Finding::OrphanListfile(spec) => write!(f, "{} has a listfile but is not installed", spec),
        }
    }
}

/// Compare the database against the listfiles on disk
pub fn verify(paths: &InstallationPaths, db: &StatusDatabase) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for record in db.iter() {
        let spec = &record.package.spec;
        match record.state {
            InstallState::HalfInstalled => findings.push(Finding::HalfInstalled {
                spec: spec.clone(),
                want: record.want,
            }),
            InstallState::Installed if !paths.listfile_path(spec).exists() => {
                findings.push(Finding::MissingListfile(spec.clone()));
            }
            _ => {}
        }
    }

    for spec in listed_packages(paths)? {
        let tracked = db
            .find(&spec)
            .is_some_and(|record| record.state != InstallState::NotInstalled);
        if !tracked {
            findings.push(Finding::OrphanListfile(spec));
        }
    }

    Ok(findings)
}
