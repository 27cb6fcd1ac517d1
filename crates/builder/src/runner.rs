//! Configure-then-build subprocess sequence

use crate::definitions::Definitions;
use crate::generator::GeneratorChoice;
use async_trait::async_trait;
use extbuild_config::BuildEnv;
use extbuild_errors::{BuildError, Error};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::info;

/// One fully specified subprocess call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: BuildEnv,
}

impl Invocation {
    /// Shell-like rendering used in log messages
    #[must_use]
    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// Spawns subprocesses and waits for them.
///
/// Implementations must let the child inherit stdin, stdout and stderr and
/// report only the exit code: `Some(0)` is success, `None` means the child
/// was terminated by a signal.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `invocation` to completion and return its exit code
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be spawned or awaited.
    async fn run(&self, invocation: &Invocation) -> Result<Option<i32>, Error>;
}

/// Executor backed by real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn run(&self, invocation: &Invocation) -> Result<Option<i32>, Error> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .env_clear()
            .envs(invocation.env.vars())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| BuildError::SpawnFailed {
                program: invocation.program.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(status.code())
    }
}

/// Result of one configure/build pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    ConfigureFailed { exit_code: Option<i32> },
    BuildFailed { exit_code: Option<i32> },
}

impl BuildOutcome {
    /// Turn a failed outcome into the matching error
    ///
    /// # Errors
    ///
    /// Returns `ConfigureFailed` or `BuildFailed` for the failed variants.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Success => Ok(()),
            Self::ConfigureFailed { exit_code } => {
                Err(BuildError::ConfigureFailed { exit_code }.into())
            }
            Self::BuildFailed { exit_code } => Err(BuildError::BuildFailed { exit_code }.into()),
        }
    }
}

/// Runs CMake configure followed by the generator's build command
#[derive(Clone)]
pub struct BuildRunner {
    cmake: PathBuf,
    env: BuildEnv,
    executor: Arc<dyn CommandExecutor>,
}

impl BuildRunner {
    #[must_use]
    pub fn new(cmake: PathBuf, env: BuildEnv, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            cmake,
            env,
            executor,
        }
    }

    /// Layer explicit variables over the environment snapshot for both steps
    #[must_use]
    pub fn with_extra_env(mut self, extra: BTreeMap<String, String>) -> Self {
        self.env = self.env.merged(extra);
        self
    }

    #[must_use]
    pub fn configure_invocation(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        definitions: &Definitions,
        generator: &GeneratorChoice,
    ) -> Invocation {
        let mut args = vec![generator.configure_flag().to_string()];
        args.extend(definitions.to_flags());
        args.push(source_dir.display().to_string());

        Invocation {
            program: self.cmake.clone(),
            args,
            cwd: build_dir.to_path_buf(),
            env: self.env.clone(),
        }
    }

    #[must_use]
    pub fn build_invocation(
        &self,
        build_dir: &Path,
        generator: &GeneratorChoice,
        targets: &[String],
    ) -> Invocation {
        Invocation {
            program: generator.program().to_path_buf(),
            args: generator.build_args(targets),
            cwd: build_dir.to_path_buf(),
            env: self.env.clone(),
        }
    }

    /// Configure then build. A failed configure skips the build step.
    ///
    /// # Errors
    ///
    /// Returns an error only when a process cannot be spawned; nonzero exits
    /// are reported through [`BuildOutcome`].
    pub async fn configure_and_build(
        &self,
        source_dir: &Path,
        build_dir: &Path,
        definitions: &Definitions,
        generator: &GeneratorChoice,
        targets: &[String],
    ) -> Result<BuildOutcome, Error> {
        let configure = self.configure_invocation(source_dir, build_dir, definitions, generator);
        info!("Configuring with command `{}`", configure.display());
        let exit_code = self.executor.run(&configure).await?;
        if exit_code != Some(0) {
            return Ok(BuildOutcome::ConfigureFailed { exit_code });
        }

        let build = self.build_invocation(build_dir, generator, targets);
        info!("Building with command `{}`", build.display());
        let exit_code = self.executor.run(&build).await?;
        if exit_code != Some(0) {
            return Ok(BuildOutcome::BuildFailed { exit_code });
        }

        Ok(BuildOutcome::Success)
    }
}

impl std::fmt::Debug for BuildRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildRunner")
            .field("cmake", &self.cmake)
            .field("env", &self.env.len())
            .finish_non_exhaustive()
    }
}
