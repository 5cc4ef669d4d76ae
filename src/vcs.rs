//! VCS metadata detection and ignore-rule evaluation.

use crate::error::IgnoreError;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::trace;

/// VCS internal directories that should never be traversed or modified.
pub const VCS_INTERNALS: &[&str] = &[
    ".git", ".jj", ".svn", ".hg", ".bzr", "_darcs", ".pijul", "CVS", ".fossil",
];

/// Exit status `git check-ignore` uses when none of the given paths is ignored.
const NO_MATCHES: i32 = 1;

/// True if `name` is the name of a VCS metadata directory.
pub fn is_vcs_internal(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| VCS_INTERNALS.contains(&name))
}

/// Answers which subdirectories of a parent are excluded by ignore rules.
///
/// Ignore rules depend on where a path sits, so the reconciler asks once per
/// visited directory and never caches the answer.
pub trait IgnoreOracle {
    /// Return the subset of `children` (immediate subdirectories of `parent`,
    /// given as absolute paths) that the ignore rules exclude.
    fn ignored_children(
        &self,
        parent: &Path,
        children: &[PathBuf],
    ) -> Result<HashSet<PathBuf>, IgnoreError>;
}

/// Ignore oracle backed by `git check-ignore`.
#[derive(Debug, Clone)]
pub struct GitCheckIgnore {
    program: PathBuf,
}

impl GitCheckIgnore {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable instead of the one found on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        GitCheckIgnore {
            program: program.into(),
        }
    }
}

impl Default for GitCheckIgnore {
    fn default() -> Self {
        Self::new()
    }
}

impl IgnoreOracle for GitCheckIgnore {
    fn ignored_children(
        &self,
        parent: &Path,
        children: &[PathBuf],
    ) -> Result<HashSet<PathBuf>, IgnoreError> {
        if children.is_empty() {
            return Ok(HashSet::new());
        }

        // Children are passed by name, relative to the parent, so the answer
        // does not depend on how the parent path was spelled.
        let by_name: HashMap<&OsStr, &PathBuf> = children
            .iter()
            .filter_map(|child| child.file_name().map(|name| (name, child)))
            .collect();

        trace!(
            "git check-ignore in {} for {} paths",
            parent.display(),
            by_name.len()
        );

        // Names go through stdin, NUL-terminated, so any byte sequence
        // survives. Literal pathspecs keep names like ":(glob)x" from being
        // read as pathspec magic.
        let mut child = Command::new(&self.program)
            .arg("check-ignore")
            .arg("--stdin")
            .arg("-z")
            .env("GIT_LITERAL_PATHSPECS", "1")
            .current_dir(parent)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(IgnoreError::Spawn)?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| IgnoreError::Io(io::Error::other("git stdin was not captured")))?;

        // Written from a second thread so a full stdout pipe cannot stall us.
        let names = &by_name;
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                for name in names.keys() {
                    stdin.write_all(&os_str_bytes(name))?;
                    stdin.write_all(b"\0")?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("git stdin writer panicked")));
            (written, output)
        });
        let output = output.map_err(IgnoreError::Io)?;

        match output.status.code() {
            Some(0) => {
                written.map_err(IgnoreError::Io)?;
                Ok(parse_check_ignore_output(&output.stdout)
                    .filter_map(|name| by_name.get(&*name).map(|path| (*path).clone()))
                    .collect())
            }
            Some(NO_MATCHES) => {
                written.map_err(IgnoreError::Io)?;
                Ok(HashSet::new())
            }
            // a write error here is just git having exited early
            code => Err(IgnoreError::Failed {
                code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

#[cfg(unix)]
fn os_str_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(name.as_bytes())
}

#[cfg(not(unix))]
fn os_str_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    match name.to_string_lossy() {
        Cow::Borrowed(name) => Cow::Borrowed(name.as_bytes()),
        Cow::Owned(name) => Cow::Owned(name.into_bytes()),
    }
}

#[cfg(unix)]
fn os_str_from_bytes(bytes: &[u8]) -> Cow<'_, OsStr> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn os_str_from_bytes(bytes: &[u8]) -> Cow<'_, OsStr> {
    Cow::Owned(String::from_utf8_lossy(bytes).into_owned().into())
}

/// Split NUL-separated `check-ignore -z` output into path names.
fn parse_check_ignore_output(stdout: &[u8]) -> impl Iterator<Item = Cow<'_, OsStr>> {
    stdout
        .split(|&b| b == 0)
        .map(|name| name.strip_suffix(b"/").unwrap_or(name))
        .filter(|name| !name.is_empty())
        .map(os_str_from_bytes)
}
