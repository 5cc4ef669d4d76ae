//! Tree walk that brings every directory under a root into the placeholder
//! invariant: a directory holds the marker file exactly when it has nothing
//! else in it.
//!
//! The walk keeps no model of the tree. Every decision re-reads the directory
//! it concerns, so an interrupted or failed run can simply be repeated.

use crate::error::ReconcileError;
use crate::placeholder::{is_empty, Change, Placeholder, DEFAULT_MARKER};
use crate::vcs::{is_vcs_internal, IgnoreOracle};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Run configuration for [`reconcile`].
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Report changes without touching the filesystem.
    pub dry_run: bool,
    /// Descend into directories whose name starts with a dot.
    pub include_hidden: bool,
    /// Marker file name.
    pub marker: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions {
            dry_run: false,
            include_hidden: false,
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// How a subdirectory found while listing a parent is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    /// Visited.
    Ordinary,
    /// A VCS metadata directory, never visited.
    Metadata,
    /// Dot-directory skipped unless hidden directories are included.
    Hidden,
    /// Symbolic link, never followed.
    Symlink,
    /// Excluded by the ignore oracle.
    Ignored,
}

/// Outcome of a successful run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Markers added, relative to the root, in the order they were reported.
    pub added: Vec<PathBuf>,
    /// Markers removed, relative to the root, in the order they were reported.
    pub removed: Vec<PathBuf>,
    /// Number of directories examined.
    pub visited: usize,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    fn record(&mut self, change: Change) {
        match change {
            Change::Added(path) => self.added.push(path),
            Change::Removed(path) => self.removed.push(path),
        }
    }
}

/// Classify the immediate subdirectories of `dir`.
///
/// Symlinks, metadata and hidden directories are decided from the listing
/// alone; the remaining candidates go to the oracle in a single batch.
/// Entries are returned sorted by path.
pub fn classify_children(
    dir: &Path,
    options: &ReconcileOptions,
    oracle: &dyn IgnoreOracle,
) -> Result<Vec<(PathBuf, ChildKind)>, ReconcileError> {
    let mut children = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| ReconcileError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ReconcileError::io(dir, e))?;
        let path = entry.path();
        // file_type does not follow symlinks
        let file_type = entry
            .file_type()
            .map_err(|e| ReconcileError::io(&path, e))?;

        let kind = if file_type.is_symlink() {
            // Only directory symlinks are worth reporting
            if !path.is_dir() {
                continue;
            }
            ChildKind::Symlink
        } else if !file_type.is_dir() {
            continue;
        } else if is_vcs_internal(&entry.file_name()) {
            ChildKind::Metadata
        } else if !options.include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            ChildKind::Hidden
        } else {
            ChildKind::Ordinary
        };
        children.push((path, kind));
    }
    children.sort_by(|(a, _), (b, _)| a.cmp(b));

    let candidates: Vec<PathBuf> = children
        .iter()
        .filter(|(_, kind)| *kind == ChildKind::Ordinary)
        .map(|(path, _)| path.clone())
        .collect();
    let ignored: HashSet<PathBuf> = oracle
        .ignored_children(dir, &candidates)
        .map_err(|source| ReconcileError::Ignore {
            path: dir.to_path_buf(),
            source,
        })?;

    for (path, kind) in &mut children {
        if *kind == ChildKind::Ordinary && ignored.contains(path) {
            *kind = ChildKind::Ignored;
        }
    }
    Ok(children)
}

/// Reconcile the tree under `root`.
///
/// `root` is always processed, even when the oracle would ignore it or its
/// name starts with a dot; only a root that is itself a VCS metadata
/// directory is left alone. The run stops at the first error, or at the next
/// directory once `cancel` is set. Changes made before that point stay.
pub fn reconcile(
    root: &Path,
    options: &ReconcileOptions,
    oracle: &dyn IgnoreOracle,
    cancel: &AtomicBool,
) -> Result<ReconcileReport, ReconcileError> {
    let placeholder = Placeholder::new(root, options.marker.as_str(), options.dry_run);
    let mut report = ReconcileReport::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if cancel.load(Ordering::SeqCst) {
            return Err(ReconcileError::Interrupted);
        }

        if dir.file_name().is_some_and(is_vcs_internal) {
            debug!("Skipping VCS metadata directory {}", dir.display());
            continue;
        }
        report.visited += 1;

        if is_empty(&dir).map_err(|e| ReconcileError::io(&dir, e))? {
            debug!("Empty directory {}", dir.display());
            let change = placeholder
                .create(&dir)
                .map_err(|e| ReconcileError::io(&dir, e))?;
            report.record(change);
            continue;
        }

        let children = classify_children(&dir, options, oracle)?;
        // Pushed in reverse so siblings are visited in sorted order.
        for (child, kind) in children.into_iter().rev() {
            match kind {
                ChildKind::Ordinary => pending.push(child),
                skipped => debug!("Skipping {:?} directory {}", skipped, child.display()),
            }
        }

        if placeholder
            .is_unnecessary(&dir)
            .map_err(|e| ReconcileError::io(&dir, e))?
        {
            let change = placeholder
                .remove(&dir)
                .map_err(|e| ReconcileError::io(&dir, e))?;
            report.record(change);
        }
    }

    Ok(report)
}
