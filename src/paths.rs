// src/paths.rs

//! On-disk layout of an installation root
//!
//! Every location Vessel reads or writes is derived here from a single root
//! directory. None of these functions touch the filesystem.

use crate::packages::PackageSpec;
use std::path::{Path, PathBuf};

/// Directory under `installed/` holding the status database and listfiles
const METADATA_DIR: &str = ".vessel";

/// Paths of one installation root
#[derive(Debug, Clone)]
pub struct InstallationPaths {
    root: PathBuf,
    installed: PathBuf,
    metadata_dir: PathBuf,
}

impl InstallationPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let installed = root.join("installed");
        let metadata_dir = installed.join(METADATA_DIR);
        Self {
            root,
            installed,
            metadata_dir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Payload tree; each triplet gets its own subdirectory
    pub fn installed(&self) -> &Path {
        &self.installed
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn status_file(&self) -> PathBuf {
        self.metadata_dir.join("status")
    }

    pub fn status_file_old(&self) -> PathBuf {
        self.metadata_dir.join("status-old")
    }

    pub fn status_file_new(&self) -> PathBuf {
        self.metadata_dir.join("status-new")
    }

    pub fn updates_dir(&self) -> PathBuf {
        self.metadata_dir.join("updates")
    }

    pub fn info_dir(&self) -> PathBuf {
        self.metadata_dir.join("info")
    }

    pub fn listfile_path(&self, spec: &PackageSpec) -> PathBuf {
        self.info_dir().join(format!("{}.list", spec.full_stem()))
    }

    /// Staging root of a built package
    pub fn package_dir(&self, spec: &PackageSpec) -> PathBuf {
        self.root.join("packages").join(spec.full_stem())
    }

    /// Root of a package's source control file
    pub fn port_dir(&self, spec: &PackageSpec) -> PathBuf {
        self.root.join("ports").join(spec.name())
    }
}
