//! keepdir - Placeholder Files for Empty Directories
//!
//! git cannot record an empty directory. keepdir walks a tree and keeps a
//! marker file (`.gitkeep` by default) in every directory that would
//! otherwise be empty, removing markers from directories that have gained
//! other content.
//!
//! ## Walk rules
//!
//! - VCS metadata directories (`.git`, `.jj`, ...) are never entered.
//! - Subdirectories excluded by git's ignore rules are never entered, except
//!   when one is the requested root.
//! - Symbolic links are never followed.
//! - Dot-directories are skipped unless hidden directories are included.

pub mod error;
pub mod guard;
pub mod placeholder;
pub mod reconcile;
pub mod vcs;

// Re-export commonly used items
pub use error::{IgnoreError, ReconcileError};
pub use guard::check_root;
pub use placeholder::{is_empty, validate_marker_name, Change, Placeholder, DEFAULT_MARKER};
pub use reconcile::{classify_children, reconcile, ChildKind, ReconcileOptions, ReconcileReport};
pub use vcs::{GitCheckIgnore, IgnoreOracle, VCS_INTERNALS};
