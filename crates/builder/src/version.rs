//! Project version extraction from CMakeLists.txt

use extbuild_errors::{BuildError, Error};
use regex::Regex;
use std::path::Path;
use tokio::fs;

const PROJECT_VERSION_PATTERN: &str = r"project\([^ ]+ VERSION (\d+\.\d+\.\d+) [^\)]+\)";

/// First `project(<name> VERSION X.Y.Z ...)` version found, line by line
///
/// # Errors
///
/// Returns an error if the pattern fails to compile.
pub fn parse_project_version(contents: &str) -> Result<Option<String>, Error> {
    let regex = Regex::new(PROJECT_VERSION_PATTERN)
        .map_err(|e| Error::internal(format!("failed to compile version regex: {e}")))?;

    Ok(contents.lines().find_map(|line| {
        regex
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }))
}

/// Read the project version from `cmake_lists`
///
/// # Errors
///
/// Returns `VersionStringNotFound` when the file has no matching
/// declaration, or an I/O error when it cannot be read.
pub async fn read_project_version(cmake_lists: &Path) -> Result<String, Error> {
    let contents = fs::read_to_string(cmake_lists)
        .await
        .map_err(|e| Error::io_with_path(&e, cmake_lists))?;

    parse_project_version(&contents)?.ok_or_else(|| {
        BuildError::VersionStringNotFound {
            path: cmake_lists.display().to_string(),
        }
        .into()
    })
}
