//! CMake definitions assembled from the environment and fixed overrides

use extbuild_config::{constants, BuildEnv};
use extbuild_errors::{BuildError, Error};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Accepted values for `CMAKE_BUILD_TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildType {
    Release,
    Debug,
    #[default]
    RelWithDebInfo,
}

impl BuildType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Debug => "Debug",
            Self::RelWithDebInfo => "RelWithDebInfo",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Release" => Ok(Self::Release),
            "Debug" => Ok(Self::Debug),
            "RelWithDebInfo" => Ok(Self::RelWithDebInfo),
            other => Err(BuildError::InvalidBuildType {
                value: other.to_string(),
            }),
        }
    }
}

/// Definitions written after the environment-derived ones.
///
/// The standard set disables test and binary targets and forces the SWIG
/// binding on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overrides {
    entries: BTreeMap<String, String>,
}

impl Overrides {
    /// No overrides at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace one override
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for Overrides {
    fn default() -> Self {
        Self::empty()
            .with("PYTHON_SWIG", "1")
            .with("UNY_build_tests", "0")
            .with("UNY_build_bin", "0")
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Overrides {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Ordered `-D` definitions for the configure step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    entries: BTreeMap<String, String>,
}

impl Definitions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect definitions from the environment snapshot, then apply
    /// `overrides`. The resulting build type is validated; nothing is spawned
    /// and nothing touches the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBuildType` when `CMAKE_BUILD_TYPE` is outside the
    /// accepted set.
    pub fn collect(env: &BuildEnv, overrides: &Overrides) -> Result<Self, Error> {
        let mut definitions = Self::new();

        if env.flag(constants::CMAKE_SKIP_RPATH) {
            definitions.insert(constants::CMAKE_SKIP_RPATH, "TRUE");
        }

        for key in constants::DEFINITION_ALLOW_LIST {
            if let Some(value) = env.get(key) {
                definitions.insert(*key, value);
            }
        }

        let build_type = env
            .get(constants::CMAKE_BUILD_TYPE)
            .unwrap_or(BuildType::default().as_str());
        definitions.insert(constants::CMAKE_BUILD_TYPE, build_type);

        for (key, value) in overrides.iter() {
            definitions.insert(key, value);
        }

        definitions.build_type()?;
        Ok(definitions)
    }

    /// Insert a definition; an existing key is replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validated build type; absent means the default
    ///
    /// # Errors
    ///
    /// Returns `InvalidBuildType` for values outside the accepted set.
    pub fn build_type(&self) -> Result<BuildType, Error> {
        match self.get(constants::CMAKE_BUILD_TYPE) {
            Some(value) => Ok(value.parse()?),
            None => Ok(BuildType::default()),
        }
    }

    /// Render as `-D<key>=<value>` flags
    #[must_use]
    pub fn to_flags(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("-D{k}={v}")).collect()
    }
}
