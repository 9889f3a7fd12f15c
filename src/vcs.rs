//! Version control staging.
//!
//! Every mutation file rewritten by an import is staged right after it is
//! written, so the index never refers to a file that was not rewritten.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

/// Stages rewritten files.
pub trait Stager {
    /// Stage one file.
    ///
    /// # Errors
    ///
    /// Returns a `Vcs` error if staging fails.
    fn stage(&self, path: &Path) -> Result<()>;
}

/// Stages with `git add`, run in the workspace root.
#[derive(Debug, Clone)]
pub struct GitStager {
    root: PathBuf,
}

impl GitStager {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Stager for GitStager {
    fn stage(&self, path: &Path) -> Result<()> {
        let output = Command::new("git")
            .arg("add")
            .arg("--")
            .arg(path)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Vcs(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            return Err(Error::Vcs(format!(
                "git add {} failed: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        debug!(path = %path.display(), "Staged");
        Ok(())
    }
}

/// Does nothing. Used with `--no-stage` and when staging is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStager;

impl Stager for NoopStager {
    fn stage(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_noop_stager() {
        assert!(NoopStager.stage(Path::new("anything.properties")).is_ok());
    }

    #[test]
    fn test_git_stager_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("m_de.properties");
        std::fs::write(&file, "a=1\n").unwrap();

        let err = GitStager::new(dir.path()).stage(&file).unwrap_err();
        assert!(matches!(err, Error::Vcs(_)));
    }
}
