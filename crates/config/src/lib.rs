#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for extbuild
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (`extbuild.toml` in the project directory)
//! - Environment variables, through an immutable [`BuildEnv`] snapshot
//! - CLI flags (applied by the binary)

pub mod constants;
mod env;

pub use env::{parse_bool, BuildEnv};

use extbuild_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub extension: ExtensionConfig,

    #[serde(default)]
    pub install: InstallConfig,

    /// Extra fixed CMake definitions, applied after environment values
    #[serde(default)]
    pub definitions: BTreeMap<String, String>,

    /// Variables layered over the environment of the configure and build
    /// subprocesses
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

/// Project layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_cmake_lists")]
    pub cmake_lists: PathBuf,
}

/// Build directory and generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    /// Destination package directory receiving the artifacts
    #[serde(default = "default_dest_dir")]
    pub dest_dir: PathBuf,
    /// Generated tree removed by `clean`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_prefer_ninja")]
    pub prefer_ninja: bool,
    /// Use a throwaway temporary build directory instead of `build_dir`
    #[serde(default)]
    pub ephemeral: bool,
    pub python_executable: Option<PathBuf>,
}

/// What gets built and which files are shipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
    #[serde(default = "default_artifacts")]
    pub artifacts: Vec<String>,
    /// Location of the artifacts relative to the build directory
    #[serde(default = "default_artifact_subdir")]
    pub artifact_subdir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default = "default_install_prefix")]
    pub prefix: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            cmake_lists: default_cmake_lists(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            dest_dir: default_dest_dir(),
            output_dir: default_output_dir(),
            prefer_ninja: default_prefer_ninja(),
            ephemeral: false,
            python_executable: None,
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            artifacts: default_artifacts(),
            artifact_subdir: default_artifact_subdir(),
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            prefix: default_install_prefix(),
        }
    }
}

// Default value functions for serde
fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cmake_lists() -> PathBuf {
    PathBuf::from("CMakeLists.txt")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build/temp")
}

fn default_dest_dir() -> PathBuf {
    PathBuf::from("build/lib")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_prefer_ninja() -> bool {
    true
}

fn default_targets() -> Vec<String> {
    vec!["_ConsensusCore2".to_string()]
}

fn default_artifacts() -> Vec<String> {
    vec![
        "_ConsensusCore2.so".to_string(),
        "ConsensusCore2.py".to_string(),
    ]
}

fn default_artifact_subdir() -> PathBuf {
    PathBuf::from("swig/lib")
}

fn default_install_prefix() -> PathBuf {
    PathBuf::from("dist")
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        debug!(path = %path.display(), "loaded configuration file");
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load `extbuild.toml` from the project directory, or defaults when the
    /// file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(project_dir: &Path) -> Result<Self, Error> {
        let config_path = project_dir.join(constants::CONFIG_FILE_NAME);

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional explicit path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>, project_dir: &Path) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load(project_dir).await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an `EXTBUILD_*` variable holds a value that cannot
    /// be parsed into the expected type.
    pub fn merge_env(&mut self, env: &BuildEnv) -> Result<(), Error> {
        if let Some(dir) = env.get(constants::EXTBUILD_BUILD_DIR) {
            self.build.build_dir = PathBuf::from(dir);
        }

        if let Some(ninja) = env.get(constants::EXTBUILD_PREFER_NINJA) {
            self.build.prefer_ninja =
                parse_bool(ninja).ok_or_else(|| ConfigError::InvalidValue {
                    field: constants::EXTBUILD_PREFER_NINJA.to_string(),
                    value: ninja.to_string(),
                })?;
        }

        Ok(())
    }

    /// Check invariants that serde defaults cannot express
    ///
    /// # Errors
    ///
    /// Returns an error when no targets or no artifacts are configured, or
    /// when an artifact name is not a plain file name.
    pub fn validate(&self) -> Result<(), Error> {
        if self.extension.targets.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                message: "extension.targets must name at least one target".to_string(),
            }
            .into());
        }

        if self.extension.artifacts.is_empty() {
            return Err(ConfigError::Invalid {
                message: "extension.artifacts must not be empty".to_string(),
            }
            .into());
        }

        for artifact in &self.extension.artifacts {
            let path = Path::new(artifact);
            if artifact.is_empty() || path.file_name() != Some(path.as_os_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "extension.artifacts".to_string(),
                    value: artifact.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Make every relative path absolute against `root`.
    ///
    /// `build.python_executable` is anchored only when it has a directory
    /// part.
    pub fn anchor(&mut self, root: &Path) {
        for path in [
            &mut self.project.source_dir,
            &mut self.build.build_dir,
            &mut self.build.dest_dir,
            &mut self.build.output_dir,
            &mut self.install.prefix,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }

        if self.project.cmake_lists.is_relative() {
            self.project.cmake_lists = self.project.source_dir.join(&self.project.cmake_lists);
        }

        // A bare interpreter name is not a path
        if let Some(python) = &mut self.build.python_executable {
            if python.is_relative() && python.components().count() > 1 {
                *python = root.join(&*python);
            }
        }
    }
}
