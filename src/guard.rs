//! Safety gate against mass changes near the top of the filesystem.

use crate::error::ReconcileError;
use directories::BaseDirs;
use std::path::{Component, Path};

/// Roots with fewer normal path components than this are refused.
pub const MIN_SAFE_DEPTH: usize = 2;

/// Refuse roots that look like they hold far more than a project: anything
/// shallower than [`MIN_SAFE_DEPTH`] and the user's home directory.
///
/// `root` should already be canonical. This is a heuristic and only applies
/// to live runs; callers skip it for dry runs and when forced.
pub fn check_root(root: &Path) -> Result<(), ReconcileError> {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    check_root_with_home(root, home.as_deref())
}

fn check_root_with_home(root: &Path, home: Option<&Path>) -> Result<(), ReconcileError> {
    let depth = root
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    let is_home = home.is_some_and(|home| {
        let home = home.canonicalize().unwrap_or_else(|_| home.to_path_buf());
        home == root
    });

    if depth < MIN_SAFE_DEPTH || is_home {
        return Err(ReconcileError::UnsafeRoot {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}
