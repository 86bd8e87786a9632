//! Working-directory context for a single script run.
//!
//! Commands run in the live working directory, which `cd` sub-commands move.
//! File steps always resolve against the directory captured at construction.

use std::path::{Component, Path, PathBuf};

/// Directory state owned by one script instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    original_dir: PathBuf,
    working_dir: PathBuf,
}

impl ExecutionContext {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base = normalize(&base_dir.into());
        Self {
            original_dir: base.clone(),
            working_dir: base,
        }
    }

    /// Directory the run started in. File steps resolve against this.
    pub fn original_dir(&self) -> &Path {
        &self.original_dir
    }

    /// Directory commands currently run in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Move the working directory to `target`, relative to the current one.
    ///
    /// Returns the new directory, or `None` when it resolves to the
    /// directory we are already in. The target is not required to exist.
    pub fn change_dir(&mut self, target: &str) -> Option<&Path> {
        let resolved = normalize(&self.working_dir.join(target));
        if resolved == self.working_dir {
            return None;
        }
        self.working_dir = resolved;
        Some(&self.working_dir)
    }

    /// Resolve a file step name against the original directory.
    pub fn resolve_file(&self, name: &str) -> PathBuf {
        normalize(&self.original_dir.join(name))
    }
}

/// Lexically collapse `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
