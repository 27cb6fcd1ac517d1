//! Legacy `--key=value` options stripped from the command line
//!
//! Older packaging scripts forwarded options such as `--boost=DIR` to the
//! native configure step. They are removed before argument parsing and mapped
//! onto CMake definitions where a mapping exists.

use crate::definitions::Overrides;
use extbuild_config::constants;
use std::ffi::OsString;

const VALUED: &[&str] = &["boost", "swig", "swig-lib"];
const FLAGS: &[&str] = &["debug", "c++11", "pbi", "modules"];

/// Options recognized and removed from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassthroughOptions {
    pub boost: Option<String>,
    pub swig: Option<String>,
    pub swig_lib: Option<String>,
    pub debug: bool,
    /// Recognized flags that have no CMake counterpart
    pub ignored: Vec<String>,
}

impl PassthroughOptions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write the mapped definitions into `overrides`
    pub fn apply(&self, overrides: &mut Overrides) {
        if let Some(boost) = &self.boost {
            overrides.insert("Boost_INCLUDE_DIRS", boost.as_str());
        }
        if let Some(swig) = &self.swig {
            overrides.insert("SWIG_COMMAND", swig.as_str());
        }
        if let Some(swig_lib) = &self.swig_lib {
            overrides.insert("SWIG_DIR", swig_lib.as_str());
        }
        if self.debug {
            overrides.insert(constants::CMAKE_BUILD_TYPE, "Debug");
        }
    }

    fn take(&mut self, arg: &str) -> bool {
        let Some(body) = arg.strip_prefix("--") else {
            return false;
        };

        let (key, value) = match body.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (body, None),
        };

        if VALUED.contains(&key) {
            let value = value.filter(|v| !v.is_empty()).map(str::to_string);
            match key {
                "boost" => self.boost = value,
                "swig" => self.swig = value,
                _ => self.swig_lib = value,
            }
            return true;
        }

        if value.is_none() && FLAGS.contains(&key) {
            if key == "debug" {
                self.debug = true;
            } else {
                self.ignored.push(arg.to_string());
            }
            return true;
        }

        false
    }
}

/// Split `args` into the recognized legacy options and everything else.
///
/// Order of the remaining arguments is preserved. A lone `--` ends option
/// filtering. Arguments that are not valid UTF-8 are never recognized and
/// pass through untouched.
#[must_use]
pub fn split_passthrough_args<I>(args: I) -> (PassthroughOptions, Vec<OsString>)
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut options = PassthroughOptions::default();
    let mut remaining = Vec::new();
    let mut filtering = true;

    for arg in args {
        let arg = arg.into();
        if filtering {
            match arg.to_str() {
                Some("--") => filtering = false,
                Some(text) if options.take(text) => continue,
                _ => {}
            }
        }
        remaining.push(arg);
    }

    (options, remaining)
}
