//! Placeholder marker files and the emptiness check they depend on.

use crate::vcs::is_vcs_internal;
use anyhow::{bail, Result};
use colored::Colorize;
use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Marker file name used when none is configured.
pub const DEFAULT_MARKER: &str = ".gitkeep";

/// True if the directory has no entries at all, hidden ones included.
pub fn is_empty(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Check that `name` can be used as a marker file name.
pub fn validate_marker_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("marker name must not be empty");
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => bail!("marker name must be a plain file name, got: {name}"),
    }
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        bail!("marker name must be a plain file name, got: {name}");
    }
    if is_vcs_internal(OsStr::new(name)) {
        bail!("marker name must not be a VCS metadata name, got: {name}");
    }
    Ok(())
}

/// A change made (or, in a dry run, previewed) to a marker file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(PathBuf),
    Removed(PathBuf),
}

impl Change {
    /// Marker path relative to the run root.
    pub fn path(&self) -> &Path {
        match self {
            Change::Added(path) | Change::Removed(path) => path,
        }
    }

    fn print(&self) {
        match self {
            Change::Added(path) => println!("{} {}", "Added:".green(), path.display()),
            Change::Removed(path) => println!("{} {}", "Removed:".red(), path.display()),
        }
    }
}

/// Creates and removes marker files under a run root.
///
/// Each call to [`Placeholder::create`] or [`Placeholder::remove`] performs at
/// most one filesystem mutation and prints exactly one notice. Dry runs print
/// the same notice and leave the filesystem alone.
#[derive(Debug, Clone)]
pub struct Placeholder {
    root: PathBuf,
    marker: String,
    dry_run: bool,
}

impl Placeholder {
    pub fn new(root: impl Into<PathBuf>, marker: impl Into<String>, dry_run: bool) -> Self {
        Placeholder {
            root: root.into(),
            marker: marker.into(),
            dry_run,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    fn marker_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.marker)
    }

    fn relative_marker_path(&self, dir: &Path) -> PathBuf {
        let marker = self.marker_path(dir);
        match marker.strip_prefix(&self.root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => marker,
        }
    }

    /// True if the marker file exists directly under `dir`.
    ///
    /// A directory carrying the marker's name is not a marker.
    pub fn has_placeholder(&self, dir: &Path) -> bool {
        // symlink_metadata so that a dangling marker symlink still counts
        fs::symlink_metadata(self.marker_path(dir)).is_ok_and(|meta| !meta.is_dir())
    }

    /// True if the marker exists and `dir` has at least one other entry.
    pub fn is_unnecessary(&self, dir: &Path) -> io::Result<bool> {
        if !self.has_placeholder(dir) {
            return Ok(false);
        }
        let marker = OsStr::new(&self.marker);
        for entry in fs::read_dir(dir)? {
            if entry?.file_name() != marker {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Add the marker to `dir`. Creating a marker that already exists is a no-op.
    pub fn create(&self, dir: &Path) -> io::Result<Change> {
        if !self.dry_run {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(self.marker_path(dir))?;
        }
        let change = Change::Added(self.relative_marker_path(dir));
        change.print();
        Ok(change)
    }

    /// Delete the marker from `dir`. The marker must exist.
    pub fn remove(&self, dir: &Path) -> io::Result<Change> {
        debug_assert!(
            self.has_placeholder(dir),
            "remove called without a marker in {}",
            dir.display()
        );
        if !self.dry_run {
            fs::remove_file(self.marker_path(dir))?;
        }
        let change = Change::Removed(self.relative_marker_path(dir));
        change.print();
        Ok(change)
    }
}
