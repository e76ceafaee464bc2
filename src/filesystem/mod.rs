// src/filesystem/mod.rs

//! Filesystem side of installs and removals
//!
//! Payload files are copied from a staged package into the installed tree and
//! every path the package owns is recorded in its listfile. Removal replays
//! the listfile. Individual file failures never abort an operation; they are
//! collected into the returned report.

pub mod listfile;

use std::fmt;
use std::path::PathBuf;
use tracing::warn;

pub use listfile::{
    install_and_write_listfile, listed_packages, read_listfile, remove_listed_files,
    search_installed_files,
};

/// A single path that could not be copied, created or removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOpError {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for FileOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed: {}: {}", self.path.display(), self.message)
    }
}

/// Outcome of copying a staged package into the installed tree
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Paths recorded in the listfile, not counting the triplet line
    pub entries: usize,
    /// Files that already existed and were claimed because no other
    /// package lists them, as left behind by an interrupted install
    pub adopted: usize,
    pub errors: Vec<FileOpError>,
}

/// Outcome of removing the paths listed in a listfile
#[derive(Debug, Clone, Default)]
pub struct RemovalReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    /// Set when there was no listfile to replay
    pub listfile_missing: bool,
    pub errors: Vec<FileOpError>,
}

pub(crate) fn record_failure(
    errors: &mut Vec<FileOpError>,
    path: impl Into<PathBuf>,
    message: impl fmt::Display,
) {
    let failure = FileOpError {
        path: path.into(),
        message: message.to_string(),
    };
    warn!("{}", failure);
    errors.push(failure);
}
