// src/db/journal.rs

//! Update journal and status file compaction
//!
//! A status change is committed by writing one small update file: the record
//! is written to a temporary `incomplete*` file in the updates directory and
//! then renamed, without overwriting, to the next numeric id. The rename is
//! the commit point.
//!
//! On load the pending updates are replayed over the status file in id order
//! and the merged result replaces the status file through a
//! `status-new` / `status-old` rotation. Update files are deleted only after
//! the new status file is in place, so an interrupted load at worst replays
//! the same updates again.

use crate::control::{serialize_paragraphs, ControlParagraph};
use crate::db::StatusDatabase;
use crate::error::{Error, Result};
use crate::packages::StatusParagraph;
use crate::paths::InstallationPaths;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name prefix of update files that have not been committed yet
const INCOMPLETE_PREFIX: &str = "incomplete";

/// Writer of status updates; owns the update id counter
#[derive(Debug)]
pub struct Journal {
    updates_dir: PathBuf,
    next_id: u64,
}

impl Journal {
    /// Open the journal in `updates_dir`, continuing after the highest id present
    pub fn open(updates_dir: impl Into<PathBuf>) -> Result<Self> {
        let updates_dir = updates_dir.into();
        let next_id = pending_updates(&updates_dir)?
            .iter()
            .filter_map(|path| update_id(path))
            .max()
            .map_or(0, |id| id + 1);

        Ok(Self {
            updates_dir,
            next_id,
        })
    }

    pub fn updates_dir(&self) -> &Path {
        &self.updates_dir
    }

    /// Id the next committed update will try to take
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Durably record one status change
    ///
    /// Returns the path of the committed update file. Any failure here is
    /// fatal to the calling operation.
    pub fn write_update(&mut self, record: &StatusParagraph) -> Result<PathBuf> {
        let text = serialize_paragraphs([&record.to_paragraph()]);
        let journal_err = |what: &str, e: std::io::Error| {
            Error::Journal(format!("{} in {}: {}", what, self.updates_dir.display(), e))
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(INCOMPLETE_PREFIX)
            .tempfile_in(&self.updates_dir)
            .map_err(|e| journal_err("Failed to create update file", e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| journal_err("Failed to write update file", e))?;

        loop {
            let target = self.updates_dir.join(self.next_id.to_string());
            self.next_id += 1;

            match tmp.persist_noclobber(&target) {
                Ok(_) => {
                    debug!(
                        "Committed update {} for {} ({})",
                        target.display(),
                        record.package.display_name(),
                        record.status_line()
                    );
                    return Ok(target);
                }
                // Another process committed this id first
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => tmp = e.file,
                Err(e) => return Err(journal_err("Failed to commit update file", e.error)),
            }
        }
    }

    /// Load the database and fold any pending updates into the status file
    pub fn load_check(paths: &InstallationPaths) -> Result<(StatusDatabase, Journal)> {
        for dir in [
            paths.installed().to_path_buf(),
            paths.metadata_dir().to_path_buf(),
            paths.info_dir(),
            paths.updates_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }

        let status_file = paths.status_file();
        let status_file_old = paths.status_file_old();
        let status_file_new = paths.status_file_new();

        let mut db = load_current_database(&status_file, &status_file_old)?;

        let updates = pending_updates(&paths.updates_dir())?;
        if updates.is_empty() {
            // Status file is up to date
            return Ok((db, Journal::open(paths.updates_dir())?));
        }

        debug!("Replaying {} pending update(s)", updates.len());
        for update in &updates {
            let text = fs::read_to_string(update)?;
            let replayed = StatusDatabase::from_text(&text, update)?;
            for record in replayed.iter() {
                db.insert(record.clone());
            }
        }

        let mut new_file = File::create(&status_file_new)?;
        new_file.write_all(db.to_text().as_bytes())?;
        new_file.sync_all()?;
        drop(new_file);

        if status_file_old.exists() {
            fs::remove_file(&status_file_old)?;
        }
        if status_file.exists() {
            fs::rename(&status_file, &status_file_old)?;
        }
        fs::rename(&status_file_new, &status_file)?;
        if status_file_old.exists() {
            fs::remove_file(&status_file_old)?;
        }

        for update in &updates {
            fs::remove_file(update)?;
        }

        info!(
            "Compacted {} update(s) into {} ({} record(s))",
            updates.len(),
            status_file.display(),
            db.len()
        );

        Ok((db, Journal::open(paths.updates_dir())?))
    }
}

/// Read the status file, recovering it from `status-old` after an interrupted rotation
fn load_current_database(status_file: &Path, status_file_old: &Path) -> Result<StatusDatabase> {
    if !status_file.exists() {
        if !status_file_old.exists() {
            // No status file yet, start from an empty database
            return Ok(StatusDatabase::new());
        }

        info!("Recovering status file from {}", status_file_old.display());
        fs::rename(status_file_old, status_file)?;
    }

    let text = fs::read_to_string(status_file)?;
    StatusDatabase::from_text(&text, status_file)
}

/// Committed update files in replay order
fn pending_updates(updates_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut updates = Vec::new();
    for entry in fs::read_dir(updates_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(INCOMPLETE_PREFIX) {
            continue;
        }
        updates.push(entry.path());
    }

    // Numeric ids first in numeric order, anything else after by name
    updates.sort_by_key(|path| {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        (update_id(path).is_none(), update_id(path), name)
    });
    Ok(updates)
}

fn update_id(path: &Path) -> Option<u64> {
    path.file_name()?.to_str()?.parse().ok()
}
