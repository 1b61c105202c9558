pub mod git;

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::error::{AppError, Result};

/// Handle on the shared local working tree where branches are checked out
/// and scanned. Every checkout mutates it in place.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    path: PathBuf,
}

impl WorkingTree {
    /// Open `path`, verifying that it is a git working tree.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(AppError::Workspace(format!(
                "Project path is not a directory: {}",
                path.display()
            )));
        }

        let repo = Repository::open(path)?;
        if repo.is_bare() {
            return Err(AppError::Workspace(format!(
                "Project path is a bare repository: {}",
                path.display()
            )));
        }

        Ok(Self::at(path))
    }

    /// Wrap `path` without validation.
    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a file name relative to the tree root.
    pub fn join(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Name of the currently checked-out branch, `None` when HEAD is detached
    /// or unborn.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let repo = Repository::open(&self.path)?;
        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(str::to_string))
    }
}
