// src/filesystem/listfile.rs

//! Listfiles: the manifest of paths an installed package owns
//!
//! The first line is the triplet; every following line is a path relative
//! to `installed/`, starting with the triplet directory. Directories and
//! files are listed in traversal order, parents before children.

use super::{record_failure, InstallReport, RemovalReport};
use crate::db::StatusDatabase;
use crate::error::Result;
use crate::packages::{BinaryParagraph, PackageSpec};
use crate::paths::InstallationPaths;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Component, Path};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Metadata files in a staged package that are never installed
fn is_control_file(entry: &DirEntry) -> bool {
    let name = entry.file_name();
    name == "CONTROL" || name == "control"
}

/// Relative path with forward slashes, as written to the listfile
fn listfile_suffix(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Copy without replacing whatever is already at `target`
fn copy_new(source: &Path, target: &Path) -> io::Result<()> {
    if fs::symlink_metadata(target).is_ok() {
        return Err(io::Error::new(ErrorKind::AlreadyExists, "file already exists"));
    }
    fs::copy(source, target).map(|_| ())
}

fn create_dir_tolerant(target: &Path) -> io::Result<()> {
    match fs::create_dir(target) {
        Err(e) if e.kind() == ErrorKind::AlreadyExists && target.is_dir() => Ok(()),
        other => other,
    }
}

/// Every line listed by packages other than `spec`
fn paths_owned_by_others(paths: &InstallationPaths, spec: &PackageSpec) -> Result<HashSet<String>> {
    let mut owned = HashSet::new();
    for other in listed_packages(paths)? {
        if other == *spec {
            continue;
        }
        if let Some(lines) = read_listfile(paths, &other)? {
            owned.extend(lines);
        }
    }
    Ok(owned)
}

/// Copy a staged package into `installed/<triplet>/` and record what it owns
///
/// A file that already exists is claimed and overwritten when no other
/// package's listfile names it, which is the state an interrupted install
/// leaves behind. Files owned by another package are reported and left out
/// of the listfile; the rest of the package is still installed. Failing to
/// write the listfile itself is fatal.
pub fn install_and_write_listfile(
    paths: &InstallationPaths,
    binary: &BinaryParagraph,
) -> Result<InstallReport> {
    let package_dir = paths.package_dir(&binary.spec);
    let triplet = binary.spec.triplet().canonical_name();
    let target_root = paths.installed().join(triplet);
    fs::create_dir_all(&target_root)?;

    let owned_elsewhere = paths_owned_by_others(paths, &binary.spec)?;

    let listfile_path = paths.listfile_path(&binary.spec);
    let mut listfile = BufWriter::new(File::create(&listfile_path)?);
    writeln!(listfile, "{}", triplet)?;

    let mut report = InstallReport::default();
    let walker = WalkDir::new(&package_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_control_file(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(&package_dir).to_path_buf();
                record_failure(&mut report.errors, path, e);
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(&package_dir) else {
            continue;
        };
        let line = format!("{}/{}", triplet, listfile_suffix(relative));
        let target = target_root.join(relative);

        let file_type = entry.file_type();
        let result = if file_type.is_dir() {
            create_dir_tolerant(&target)
        } else if file_type.is_file() {
            match copy_new(entry.path(), &target) {
                Err(e)
                    if e.kind() == ErrorKind::AlreadyExists && !owned_elsewhere.contains(&line) =>
                {
                    debug!("Claiming existing {}", target.display());
                    fs::copy(entry.path(), &target).map(|_| report.adopted += 1)
                }
                other => other,
            }
        } else {
            record_failure(&mut report.errors, entry.path(), "cannot handle file type");
            continue;
        };

        if let Err(e) = result {
            record_failure(&mut report.errors, &target, e);
            continue;
        }

        writeln!(listfile, "{}", line)?;
        report.entries += 1;
    }

    listfile.flush()?;
    listfile.get_ref().sync_all()?;

    debug!(
        "Wrote listfile {} ({} entries)",
        listfile_path.display(),
        report.entries
    );
    Ok(report)
}

/// Lines of a package's listfile, or `None` if it has none
pub fn read_listfile(paths: &InstallationPaths, spec: &PackageSpec) -> Result<Option<Vec<String>>> {
    let file = match File::open(paths.listfile_path(spec)) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let mut line = line?;
        if line.ends_with('\r') {
            line.pop();
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    Ok(Some(lines))
}

/// Remove everything a package's listfile names, then the listfile
///
/// Files go first. Directories are removed afterwards in reverse listing
/// order and only when empty, so directories still holding another
/// package's files stay.
pub fn remove_listed_files(paths: &InstallationPaths, spec: &PackageSpec) -> Result<RemovalReport> {
    let mut report = RemovalReport::default();

    let Some(lines) = read_listfile(paths, spec)? else {
        warn!("No listfile for {}, nothing to remove", spec);
        report.listfile_missing = true;
        return Ok(report);
    };

    let mut dirs_touched = Vec::new();
    for suffix in &lines {
        let relative = Path::new(suffix);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            record_failure(&mut report.errors, relative, "path escapes the installed tree");
            continue;
        }

        let target = paths.installed().join(relative);
        let metadata = match fs::symlink_metadata(&target) {
            Ok(metadata) => metadata,
            Err(e) => {
                record_failure(&mut report.errors, &target, e);
                continue;
            }
        };

        if metadata.is_dir() {
            dirs_touched.push(target);
        } else if metadata.is_file() || metadata.file_type().is_symlink() {
            match fs::remove_file(&target) {
                Ok(()) => report.files_removed += 1,
                Err(e) => record_failure(&mut report.errors, &target, e),
            }
        } else {
            record_failure(&mut report.errors, &target, "cannot handle file type");
        }
    }

    for dir in dirs_touched.iter().rev() {
        if !is_empty_dir(dir) {
            continue;
        }
        match fs::remove_dir(dir) {
            Ok(()) => report.dirs_removed += 1,
            Err(e) => record_failure(&mut report.errors, dir, e),
        }
    }

    fs::remove_file(paths.listfile_path(spec))?;

    info!(
        "Removed {} file(s) and {} director(ies) of {}",
        report.files_removed, report.dirs_removed, spec
    );
    Ok(report)
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Installed files whose listed path contains `needle`
pub fn search_installed_files(
    paths: &InstallationPaths,
    db: &StatusDatabase,
    needle: &str,
) -> Result<Vec<(PackageSpec, String)>> {
    let mut matches = Vec::new();
    for record in db.iter().filter(|r| r.is_installed()) {
        let spec = &record.package.spec;
        let Some(lines) = read_listfile(paths, spec)? else {
            continue;
        };
        matches.extend(
            lines
                .into_iter()
                .filter(|line| line.contains(needle))
                .map(|line| (spec.clone(), line)),
        );
    }
    Ok(matches)
}

/// Identities of every listfile present in the info directory
pub fn listed_packages(paths: &InstallationPaths) -> Result<Vec<PackageSpec>> {
    let info_dir = paths.info_dir();
    let entries = match fs::read_dir(&info_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut specs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "list") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match PackageSpec::from_listfile_stem(stem) {
            Ok(spec) => specs.push(spec),
            Err(e) => warn!("Ignoring {}: {}", path.display(), e),
        }
    }
    specs.sort();
    Ok(specs)
}
