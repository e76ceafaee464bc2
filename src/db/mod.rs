// src/db/mod.rs

//! Status database for Vessel
//!
//! This module handles the installed-package index:
//! - The in-memory `StatusDatabase`, one record per package identity
//! - Serialization to and from the canonical status file
//! - The update journal and its compaction (see [`journal`])

pub mod journal;

use crate::control::{parse_paragraphs, serialize_paragraphs, ControlParagraph};
use crate::error::Result;
use crate::packages::{PackageSpec, StatusParagraph, Triplet};
use crate::paths::InstallationPaths;
use indexmap::IndexMap;
use std::path::Path;

pub use journal::Journal;

/// Most recent status record of every known package identity
///
/// Iteration follows first-insertion order; re-inserting an identity
/// replaces its record in place.
#[derive(Debug, Clone, Default)]
pub struct StatusDatabase {
    records: IndexMap<PackageSpec, StatusParagraph>,
}

impl StatusDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a record, keyed by its package identity
    pub fn insert(&mut self, record: StatusParagraph) {
        self.records.insert(record.package.spec.clone(), record);
    }

    pub fn find(&self, spec: &PackageSpec) -> Option<&StatusParagraph> {
        self.records.get(spec)
    }

    /// Record of `name` for `triplet`, only if it is fully installed
    pub fn find_installed(&self, name: &str, triplet: &Triplet) -> Option<&StatusParagraph> {
        let spec = PackageSpec::new(name, triplet.clone()).ok()?;
        self.find(&spec).filter(|record| record.is_installed())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusParagraph> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse a status file body
    pub fn from_text(text: &str, origin: &Path) -> Result<Self> {
        let mut db = Self::new();
        for paragraph in parse_paragraphs(text, origin)? {
            db.insert(StatusParagraph::from_paragraph(&paragraph)?);
        }
        Ok(db)
    }

    /// Render the whole database as a status file body
    pub fn to_text(&self) -> String {
        let paragraphs: Vec<_> = self.iter().map(ControlParagraph::to_paragraph).collect();
        serialize_paragraphs(&paragraphs)
    }
}

impl<'a> IntoIterator for &'a StatusDatabase {
    type Item = &'a StatusParagraph;
    type IntoIter = indexmap::map::Values<'a, PackageSpec, StatusParagraph>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

/// Load the status database, replaying and compacting pending updates
///
/// Returns the journal positioned to write the next update.
pub fn load_or_repair_database(paths: &InstallationPaths) -> Result<(StatusDatabase, Journal)> {
    Journal::load_check(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::{BinaryParagraph, InstallState, Want};

    fn record(name: &str, triplet: &str, state: InstallState) -> StatusParagraph {
        let spec = PackageSpec::new(name, Triplet::new(triplet)).unwrap();
        StatusParagraph::new(BinaryParagraph::new(spec), Want::Install, state)
    }

    #[test]
    fn test_insert_is_upsert() {
        let mut db = StatusDatabase::new();
        db.insert(record("zlib", "x64-linux", InstallState::HalfInstalled));
        db.insert(record("openssl", "x64-linux", InstallState::Installed));
        db.insert(record("zlib", "x64-linux", InstallState::Installed));

        assert_eq!(db.len(), 2);
        let names: Vec<_> = db.iter().map(|r| r.package.spec.name().to_string()).collect();
        assert_eq!(names, vec!["zlib", "openssl"]);

        let spec = PackageSpec::new("zlib", Triplet::new("x64-linux")).unwrap();
        assert_eq!(db.find(&spec).unwrap().state, InstallState::Installed);
    }

    #[test]
    fn test_same_name_different_triplets_are_distinct() {
        let mut db = StatusDatabase::new();
        db.insert(record("zlib", "x64-linux", InstallState::Installed));
        db.insert(record("zlib", "x86-linux", InstallState::HalfInstalled));

        assert_eq!(db.len(), 2);
        assert!(db.find_installed("zlib", &Triplet::new("x64-linux")).is_some());
        assert!(db.find_installed("zlib", &Triplet::new("x86-linux")).is_none());
        assert!(db.find_installed("zlib", &Triplet::new("arm-linux")).is_none());
    }

    #[test]
    fn test_text_round_trip() {
        let mut db = StatusDatabase::new();
        db.insert(record("zlib", "x64-linux", InstallState::Installed));
        db.insert(record("curl", "x64-linux", InstallState::HalfInstalled));

        let text = db.to_text();
        let loaded = StatusDatabase::from_text(&text, Path::new("status")).unwrap();
        assert_eq!(loaded.len(), 2);
        let original: Vec<_> = db.iter().cloned().collect();
        let reloaded: Vec<_> = loaded.iter().cloned().collect();
        assert_eq!(original, reloaded);
    }
}
