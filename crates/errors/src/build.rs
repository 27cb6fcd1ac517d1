//! Build orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Render an optional exit code; `None` means the child died from a signal.
#[allow(clippy::ref_option)]
fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"))
}

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("cannot find `{tool}` command, please populate {env_var} environment variable")]
    ToolchainNotFound { tool: String, env_var: String },

    #[error("failed to configure the project ({})", describe_exit(.exit_code))]
    ConfigureFailed { exit_code: Option<i32> },

    #[error("failed to build the project ({})", describe_exit(.exit_code))]
    BuildFailed { exit_code: Option<i32> },

    #[error("unable to find version string in {path}")]
    VersionStringNotFound { path: String },

    #[error("CMAKE_BUILD_TYPE must be in (Release, Debug, RelWithDebInfo), got `{value}`")]
    InvalidBuildType { value: String },

    #[error("build artifact missing: {path}")]
    ArtifactMissing { path: String },

    #[error("failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolchainNotFound { .. } => {
                Some("Install the tool or point the named environment variable at it.")
            }
            Self::ConfigureFailed { .. } => {
                Some("Remove the build directory with `extbuild clean` and retry.")
            }
            Self::BuildFailed { .. } => Some("Inspect the compiler output above."),
            Self::VersionStringNotFound { .. } => {
                Some("Declare `project(<name> VERSION X.Y.Z ...)` in CMakeLists.txt.")
            }
            Self::InvalidBuildType { .. } => {
                Some("Set CMAKE_BUILD_TYPE to Release, Debug or RelWithDebInfo.")
            }
            Self::ArtifactMissing { .. } => {
                Some("Check that the build targets produce the configured artifacts.")
            }
            Self::SpawnFailed { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ConfigureFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ToolchainNotFound { .. } => "build.toolchain_not_found",
            Self::ConfigureFailed { .. } => "build.configure_failed",
            Self::BuildFailed { .. } => "build.build_failed",
            Self::VersionStringNotFound { .. } => "build.version_string_not_found",
            Self::InvalidBuildType { .. } => "build.invalid_build_type",
            Self::ArtifactMissing { .. } => "build.artifact_missing",
            Self::SpawnFailed { .. } => "build.spawn_failed",
        };
        Some(code)
    }
}
