//! Resolution of external build tools to executable paths

use extbuild_config::{constants, BuildEnv};
use extbuild_errors::{BuildError, Error};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An external command together with the variable that may override it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub name: &'static str,
    pub env_var: &'static str,
}

/// CMake is mandatory; nothing can be configured without it
pub const CMAKE: Tool = Tool {
    name: "cmake",
    env_var: constants::CMAKE_COMMAND,
};

/// Ninja is optional; its absence falls back to Make
pub const NINJA: Tool = Tool {
    name: "ninja",
    env_var: constants::NINJA_COMMAND,
};

/// Locates executables using an environment snapshot.
///
/// `cwd` anchors relative `PATH` entries and relative override paths.
#[derive(Debug, Clone, Copy)]
pub struct ToolchainLocator<'a> {
    env: &'a BuildEnv,
    cwd: &'a Path,
}

impl<'a> ToolchainLocator<'a> {
    #[must_use]
    pub fn new(env: &'a BuildEnv, cwd: &'a Path) -> Self {
        Self { env, cwd }
    }

    #[must_use]
    pub fn env(&self) -> &'a BuildEnv {
        self.env
    }

    /// Resolve `command` to an executable regular file.
    ///
    /// A non-empty `override_var` naming an executable file wins; otherwise
    /// `PATH` is scanned in order. Returns `None` when nothing matches.
    #[must_use]
    pub fn resolve(&self, command: &str, override_var: Option<&str>) -> Option<PathBuf> {
        if let Some(candidate) = override_var.and_then(|var| self.env.get(var)) {
            if let Some(path) = self.check_override(candidate) {
                debug!(command, path = %path.display(), "using override");
                return Some(path);
            }
            warn!(
                command,
                value = candidate,
                "override does not name an executable file, searching PATH"
            );
        }

        let search_path = self.search_path()?;
        match which::which_in(command, Some(search_path), self.cwd) {
            Ok(path) => {
                debug!(command, path = %path.display(), "found on PATH");
                Some(path)
            }
            Err(_) => None,
        }
    }

    /// Resolve a known tool
    #[must_use]
    pub fn find(&self, tool: &Tool) -> Option<PathBuf> {
        self.resolve(tool.name, Some(tool.env_var))
    }

    /// Resolve a tool that the build cannot proceed without
    ///
    /// # Errors
    ///
    /// Returns `ToolchainNotFound` naming the override variable.
    pub fn require(&self, tool: &Tool) -> Result<PathBuf, Error> {
        self.find(tool).ok_or_else(|| {
            BuildError::ToolchainNotFound {
                tool: tool.name.to_string(),
                env_var: tool.env_var.to_string(),
            }
            .into()
        })
    }

    fn check_override(&self, candidate: &str) -> Option<PathBuf> {
        // Bare names carry no separator and would make `which` search PATH.
        if !candidate.contains(std::path::MAIN_SEPARATOR) && !candidate.contains('/') {
            return None;
        }
        which::which_in(candidate, None::<&str>, self.cwd).ok()
    }

    /// `PATH` with surrounding double quotes stripped from each entry
    fn search_path(&self) -> Option<std::ffi::OsString> {
        let raw = self.env.path_var()?;
        let entries = std::env::split_paths(raw).map(|entry| {
            let text = entry.to_string_lossy();
            PathBuf::from(text.trim_matches('"'))
        });
        std::env::join_paths(entries).ok()
    }
}
