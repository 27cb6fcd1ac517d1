//! Lifecycle hooks for the packaging commands
//!
//! Each hook is a thin adapter: [`BuildHook`] drives the orchestrator,
//! [`CleanHook`] removes the generated tree, and [`InstallHook`] combines the
//! two with an artifact copy into the install prefix.

use crate::orchestrator::{BuildReport, ExtensionOrchestrator};
use async_trait::async_trait;
use extbuild_errors::Error;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// What a hook did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookReport {
    Built(BuildReport),
    /// `removed` is false when there was nothing to remove
    Cleaned { removed: bool },
    Installed {
        build: BuildReport,
        installed: Vec<PathBuf>,
    },
}

/// A packaging command step
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns the first fatal error of the step.
    async fn run(&self) -> Result<HookReport, Error>;
}

/// Builds the extension into the destination package directory
#[derive(Debug, Clone)]
pub struct BuildHook {
    orchestrator: ExtensionOrchestrator,
    dest_dir: PathBuf,
}

impl BuildHook {
    #[must_use]
    pub fn new(orchestrator: ExtensionOrchestrator, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            dest_dir: dest_dir.into(),
        }
    }

    #[must_use]
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    #[must_use]
    pub fn orchestrator(&self) -> &ExtensionOrchestrator {
        &self.orchestrator
    }
}

#[async_trait]
impl LifecycleHook for BuildHook {
    fn name(&self) -> &'static str {
        "build"
    }

    async fn run(&self) -> Result<HookReport, Error> {
        self.orchestrator
            .build(&self.dest_dir)
            .await
            .map(HookReport::Built)
    }
}

/// Removes the generated output tree; a missing tree is not an error
#[derive(Debug, Clone)]
pub struct CleanHook {
    output_dir: PathBuf,
}

impl CleanHook {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    async fn remove(&self) -> Result<bool, Error> {
        match fs::remove_dir_all(&self.output_dir).await {
            Ok(()) => {
                info!(path = %self.output_dir.display(), "removed generated tree");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.output_dir.display(), "nothing to clean");
                Ok(false)
            }
            Err(e) => Err(Error::io_with_path(&e, &self.output_dir)),
        }
    }
}

#[async_trait]
impl LifecycleHook for CleanHook {
    fn name(&self) -> &'static str {
        "clean"
    }

    async fn run(&self) -> Result<HookReport, Error> {
        let removed = self.remove().await?;
        Ok(HookReport::Cleaned { removed })
    }
}

/// Build, copy the artifacts into `prefix`, then clean.
///
/// Cleaning happens whether or not the install succeeded. An install error
/// takes precedence over a clean error.
#[derive(Debug, Clone)]
pub struct InstallHook {
    build: BuildHook,
    clean: CleanHook,
    prefix: PathBuf,
}

impl InstallHook {
    #[must_use]
    pub fn new(build: BuildHook, clean: CleanHook, prefix: impl Into<PathBuf>) -> Self {
        Self {
            build,
            clean,
            prefix: prefix.into(),
        }
    }

    async fn install(&self) -> Result<HookReport, Error> {
        let build = match self.build.run().await? {
            HookReport::Built(report) => report,
            other => return Err(Error::internal(format!("unexpected build report: {other:?}"))),
        };

        fs::create_dir_all(&self.prefix)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.prefix))?;

        let artifacts = &self.build.orchestrator().spec().artifacts;
        let mut installed = Vec::with_capacity(artifacts.len());
        for name in artifacts {
            let source = self.build.dest_dir().join(name);
            let target = self.prefix.join(name);
            fs::copy(&source, &target)
                .await
                .map_err(|e| Error::io_with_path(&e, &source))?;
            debug!(to = %target.display(), "installed artifact");
            installed.push(target);
        }

        info!(prefix = %self.prefix.display(), count = installed.len(), "extension installed");
        Ok(HookReport::Installed { build, installed })
    }
}

#[async_trait]
impl LifecycleHook for InstallHook {
    fn name(&self) -> &'static str {
        "install"
    }

    async fn run(&self) -> Result<HookReport, Error> {
        let installed = self.install().await;
        let cleaned = self.clean.remove().await;

        match (installed, cleaned) {
            (Err(install_err), Err(clean_err)) => {
                warn!(error = %clean_err, "clean after failed install also failed");
                Err(install_err)
            }
            (Err(install_err), Ok(_)) => Err(install_err),
            (Ok(_), Err(clean_err)) => Err(clean_err),
            (Ok(report), Ok(_)) => Ok(report),
        }
    }
}
