//! Error types shared by the reconciler and its collaborators.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the external ignore-rule evaluator.
///
/// "No path is ignored" is not an error; oracles report it as an empty set.
#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("failed to run git")]
    Spawn(#[source] io::Error),

    #[error("failed to exchange data with git")]
    Io(#[source] io::Error),

    #[error("git check-ignore exited with {}: {stderr}", describe_exit(.code))]
    Failed { code: Option<i32>, stderr: String },
}

/// Fatal conditions that stop a run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("cannot access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot evaluate ignore rules in {}", .path.display())]
    Ignore {
        path: PathBuf,
        #[source]
        source: IgnoreError,
    },

    #[error(
        "refusing to modify {}: it looks like a top-level directory (use --force to override or --dry to preview)",
        .path.display()
    )]
    UnsafeRoot { path: PathBuf },

    #[error("interrupted")]
    Interrupted,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ReconcileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReconcileError::Io {
            path: path.into(),
            source,
        }
    }
}
