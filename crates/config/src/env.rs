//! Immutable snapshot of the process environment
//!
//! The orchestrator never consults `std::env` directly. The binary captures
//! the environment once at startup and hands the resulting [`BuildEnv`] to
//! every component; tests build one from literal pairs.

use crate::constants;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Snapshot of environment variables taken once per invocation
///
/// Names and values are kept as OS strings so that children see the
/// environment unchanged. The `&str` accessors only report UTF-8 values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    vars: BTreeMap<OsString, OsString>,
}

impl BuildEnv {
    /// Capture the current process environment
    #[must_use]
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars_os())
    }

    /// Build a snapshot from explicit key/value pairs
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `key` when it is present, non-empty and valid UTF-8
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_raw(key).filter(|value| !value.is_empty())
    }

    /// Raw UTF-8 value of `key`, including empty strings
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.get_os(key).and_then(OsStr::to_str)
    }

    /// Value of `key` as stored, whatever its encoding
    #[must_use]
    pub fn get_os(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    /// Interpret `key` as a boolean.
    ///
    /// Missing or unparseable values are `false`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(parse_bool).unwrap_or(false)
    }

    /// The `PATH` variable, if set
    #[must_use]
    pub fn path_var(&self) -> Option<&str> {
        self.get(constants::PATH)
    }

    /// Iterate over all variables in key order
    pub fn vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// Return a new snapshot with `extra` layered over this one
    #[must_use]
    pub fn merged<I, K, V>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let mut vars = self.vars.clone();
        vars.extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { vars }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Permissive truthy-string parsing.
///
/// Accepts `y`, `yes`, `t`, `true`, `on`, `1` and their negative
/// counterparts, case-insensitively. Anything else, including padded
/// values, yields `None`.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}
