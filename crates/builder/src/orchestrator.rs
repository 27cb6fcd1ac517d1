//! Build orchestration for one native extension
//!
//! The orchestrator owns the whole sequence: toolchain resolution,
//! definition assembly, generator selection, configure/build with a single
//! retry after a purge, and artifact relocation. Lifecycle hooks in
//! [`crate::hooks`] are thin adapters over it.

use crate::build_dir::BuildDirectory;
use crate::definitions::{Definitions, Overrides};
use crate::generator::{GeneratorChoice, GeneratorKind};
use crate::runner::{BuildOutcome, BuildRunner, CommandExecutor, SystemExecutor};
use crate::toolchain::{ToolchainLocator, CMAKE};
use extbuild_config::{BuildEnv, Config};
use extbuild_errors::{BuildError, Error};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// A configure failure is retried once after purging the build directory.
const MAX_ATTEMPTS: u32 = 2;

/// What to build and which files to ship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSpec {
    pub source_dir: PathBuf,
    pub targets: Vec<String>,
    pub artifacts: Vec<String>,
    /// Artifact location relative to the build directory
    pub artifact_subdir: PathBuf,
}

impl ExtensionSpec {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_dir: config.project.source_dir.clone(),
            targets: config.extension.targets.clone(),
            artifacts: config.extension.artifacts.clone(),
            artifact_subdir: config.extension.artifact_subdir.clone(),
        }
    }
}

/// How the build directory is allocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDirPolicy {
    Persistent(PathBuf),
    /// Temporary directory, optionally under the given parent
    Ephemeral(Option<PathBuf>),
}

impl BuildDirPolicy {
    async fn allocate(&self) -> Result<BuildDirectory, Error> {
        match self {
            Self::Persistent(path) => BuildDirectory::persistent(path).await,
            Self::Ephemeral(parent) => BuildDirectory::ephemeral(parent.as_deref()),
        }
    }
}

/// Result of a build request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildReport {
    /// All artifacts were already present; nothing was spawned
    Skipped,
    Built {
        generator: GeneratorKind,
        attempts: u32,
        artifacts: Vec<PathBuf>,
    },
}

/// Drives the configure/build sequence for one [`ExtensionSpec`]
#[derive(Clone)]
pub struct ExtensionOrchestrator {
    spec: ExtensionSpec,
    env: BuildEnv,
    work_dir: PathBuf,
    overrides: Overrides,
    extra_env: BTreeMap<String, String>,
    prefer_ninja: bool,
    build_dir: BuildDirPolicy,
    executor: Arc<dyn CommandExecutor>,
}

impl ExtensionOrchestrator {
    /// New orchestrator with the standard overrides, Ninja preferred and an
    /// ephemeral build directory
    #[must_use]
    pub fn new(spec: ExtensionSpec, env: BuildEnv, work_dir: PathBuf) -> Self {
        Self {
            spec,
            env,
            work_dir,
            overrides: Overrides::default(),
            extra_env: BTreeMap::new(),
            prefer_ninja: true,
            build_dir: BuildDirPolicy::Ephemeral(None),
            executor: Arc::new(SystemExecutor),
        }
    }

    /// Orchestrator configured from a loaded [`Config`].
    ///
    /// `config` is expected to be anchored. `[definitions]` entries and the
    /// Python interpreter (explicit, or `python3` from `PATH`) join the
    /// standard overrides; `[environment]` entries reach both subprocesses.
    #[must_use]
    pub fn from_config(config: &Config, env: BuildEnv, work_dir: PathBuf) -> Self {
        let mut overrides = Overrides::default();

        let python = config.build.python_executable.clone().or_else(|| {
            ToolchainLocator::new(&env, &work_dir).resolve("python3", None)
        });
        if let Some(python) = python {
            overrides.insert("PYTHON_EXECUTABLE", python.display().to_string());
        }
        overrides.extend(config.definitions.clone());

        let build_dir = if config.build.ephemeral {
            BuildDirPolicy::Ephemeral(Some(config.build.output_dir.clone()))
        } else {
            BuildDirPolicy::Persistent(config.build.build_dir.clone())
        };

        Self::new(ExtensionSpec::from_config(config), env, work_dir)
            .with_overrides(overrides)
            .with_extra_env(config.environment.clone())
            .with_prefer_ninja(config.build.prefer_ninja)
            .with_build_dir(build_dir)
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Variables layered over the snapshot for the configure and build steps
    #[must_use]
    pub fn with_extra_env(mut self, extra_env: BTreeMap<String, String>) -> Self {
        self.extra_env = extra_env;
        self
    }

    #[must_use]
    pub fn with_prefer_ninja(mut self, prefer_ninja: bool) -> Self {
        self.prefer_ninja = prefer_ninja;
        self
    }

    #[must_use]
    pub fn with_build_dir(mut self, build_dir: BuildDirPolicy) -> Self {
        self.build_dir = build_dir;
        self
    }

    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    #[must_use]
    pub fn spec(&self) -> &ExtensionSpec {
        &self.spec
    }

    #[must_use]
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Mutable access for late additions such as command-line options
    pub fn overrides_mut(&mut self) -> &mut Overrides {
        &mut self.overrides
    }

    /// Whether every artifact already exists in `dest_dir`
    #[must_use]
    pub fn artifacts_present(&self, dest_dir: &Path) -> bool {
        self.spec
            .artifacts
            .iter()
            .all(|name| dest_dir.join(name).is_file())
    }

    /// Build the extension and copy its artifacts into `dest_dir`.
    ///
    /// When all artifacts already exist there, nothing runs. No source
    /// timestamps are compared.
    ///
    /// # Errors
    ///
    /// Returns an error when cmake is missing, the build type is invalid, the
    /// configure step fails twice, the build step fails, or an artifact is
    /// missing or cannot be copied.
    pub async fn build(&self, dest_dir: &Path) -> Result<BuildReport, Error> {
        if self.artifacts_present(dest_dir) {
            info!(dest = %dest_dir.display(), "artifacts present, skipping build");
            return Ok(BuildReport::Skipped);
        }

        let locator = ToolchainLocator::new(&self.env, &self.work_dir);
        let cmake = locator.require(&CMAKE)?;
        let definitions = Definitions::collect(&self.env, &self.overrides)?;
        let generator = GeneratorChoice::select(self.prefer_ninja, &locator);
        debug!(
            cmake = %cmake.display(),
            generator = %generator.kind(),
            definitions = definitions.len(),
            "build plan ready"
        );

        let build_dir = self.build_dir.allocate().await?;
        let runner = BuildRunner::new(cmake, self.env.clone(), Arc::clone(&self.executor))
            .with_extra_env(self.extra_env.clone());

        let attempts = self
            .run_with_retry(&runner, &build_dir, &definitions, &generator)
            .await?;

        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, dest_dir))?;
        let artifacts = self.copy_artifacts(build_dir.path(), dest_dir).await?;

        info!(
            generator = %generator.kind(),
            attempts,
            dest = %dest_dir.display(),
            "extension built"
        );

        Ok(BuildReport::Built {
            generator: generator.kind(),
            attempts,
            artifacts,
        })
    }

    async fn run_with_retry(
        &self,
        runner: &BuildRunner,
        build_dir: &BuildDirectory,
        definitions: &Definitions,
        generator: &GeneratorChoice,
    ) -> Result<u32, Error> {
        let mut attempt = 1;
        loop {
            let outcome = runner
                .configure_and_build(
                    &self.spec.source_dir,
                    build_dir.path(),
                    definitions,
                    generator,
                    &self.spec.targets,
                )
                .await?;

            match outcome {
                BuildOutcome::Success => return Ok(attempt),
                BuildOutcome::ConfigureFailed { exit_code } if attempt < MAX_ATTEMPTS => {
                    warn!(
                        ?exit_code,
                        build_dir = %build_dir.path().display(),
                        "configure failed, purging build directory and retrying"
                    );
                    build_dir.purge().await?;
                    attempt += 1;
                }
                failed => return failed.into_result().map(|()| attempt),
            }
        }
    }

    async fn copy_artifacts(&self, build_dir: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let source_dir = build_dir.join(&self.spec.artifact_subdir);
        let mut copied = Vec::with_capacity(self.spec.artifacts.len());

        for name in &self.spec.artifacts {
            let source = source_dir.join(name);
            if !source.is_file() {
                return Err(BuildError::ArtifactMissing {
                    path: source.display().to_string(),
                }
                .into());
            }

            let target = dest_dir.join(name);
            fs::copy(&source, &target)
                .await
                .map_err(|e| Error::io_with_path(&e, &target))?;
            debug!(from = %source.display(), to = %target.display(), "copied artifact");
            copied.push(target);
        }

        Ok(copied)
    }
}

impl std::fmt::Debug for ExtensionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionOrchestrator")
            .field("spec", &self.spec)
            .field("work_dir", &self.work_dir)
            .field("overrides", &self.overrides)
            .field("extra_env", &self.extra_env)
            .field("prefer_ninja", &self.prefer_ninja)
            .field("build_dir", &self.build_dir)
            .finish_non_exhaustive()
    }
}
