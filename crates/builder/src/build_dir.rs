//! Scoped build directories

use extbuild_errors::Error;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::debug;

/// Where the configure and build steps run.
///
/// An ephemeral directory is deleted when the value is dropped, on success
/// and on error alike. A persistent directory outlives the invocation.
#[derive(Debug)]
pub enum BuildDirectory {
    Ephemeral(TempDir),
    Persistent(PathBuf),
}

impl BuildDirectory {
    /// Create (if needed) and use a fixed directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn persistent(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        fs::create_dir_all(&path)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        Ok(Self::Persistent(path))
    }

    /// Create a fresh temporary directory, inside `parent` when given
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn ephemeral(parent: Option<&Path>) -> Result<Self, Error> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("extbuild-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(&e, parent))?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "created ephemeral build directory");
        Ok(Self::Ephemeral(dir))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Ephemeral(dir) => dir.path(),
            Self::Persistent(path) => path,
        }
    }

    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral(_))
    }

    /// Remove everything inside the directory, keeping the directory itself
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be removed.
    pub async fn purge(&self) -> Result<(), Error> {
        let root = self.path();
        let mut entries = fs::read_dir(root)
            .await
            .map_err(|e| Error::io_with_path(&e, root))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let removed = if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            removed.map_err(|e| Error::io_with_path(&e, &path))?;
        }

        debug!(path = %root.display(), "purged build directory");
        Ok(())
    }
}
