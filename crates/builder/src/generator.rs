//! Choice between the Make and Ninja build-file generators

use crate::toolchain::{ToolchainLocator, NINJA};
use extbuild_config::constants;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Make,
    Ninja,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Make => f.write_str("make"),
            Self::Ninja => f.write_str("ninja"),
        }
    }
}

/// Selected generator with everything needed to drive the build step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorChoice {
    kind: GeneratorKind,
    program: PathBuf,
    verbose: bool,
}

impl GeneratorChoice {
    /// Ninja when preferred and resolvable, Make otherwise.
    ///
    /// Verbosity comes from the `VERBOSE` variable of the locator's
    /// environment snapshot.
    #[must_use]
    pub fn select(prefer_ninja: bool, locator: &ToolchainLocator<'_>) -> Self {
        let verbose = locator.env().flag(constants::VERBOSE);

        if prefer_ninja {
            if let Some(ninja) = locator.find(&NINJA) {
                return Self::ninja(ninja, verbose);
            }
            debug!("ninja not found, falling back to make");
        }

        Self::make(verbose)
    }

    #[must_use]
    pub fn make(verbose: bool) -> Self {
        Self {
            kind: GeneratorKind::Make,
            program: PathBuf::from("make"),
            verbose,
        }
    }

    #[must_use]
    pub fn ninja(program: PathBuf, verbose: bool) -> Self {
        Self {
            kind: GeneratorKind::Ninja,
            program,
            verbose,
        }
    }

    #[must_use]
    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Name of the external tool this generator depends on
    #[must_use]
    pub fn toolchain_name(&self) -> &'static str {
        match self.kind {
            GeneratorKind::Make => "make",
            GeneratorKind::Ninja => NINJA.name,
        }
    }

    #[must_use]
    pub fn verbosity_flag(&self) -> &'static str {
        match self.kind {
            GeneratorKind::Make => "VERBOSE=1",
            GeneratorKind::Ninja => "-v",
        }
    }

    /// `-G` flag passed to the configure step
    #[must_use]
    pub fn configure_flag(&self) -> &'static str {
        match self.kind {
            GeneratorKind::Make => "-GUnix Makefiles",
            GeneratorKind::Ninja => "-GNinja",
        }
    }

    /// Arguments for the build program
    #[must_use]
    pub fn build_args(&self, targets: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(targets.len() + 1);
        if self.verbose {
            args.push(self.verbosity_flag().to_string());
        }
        args.extend(targets.iter().cloned());
        args
    }
}
