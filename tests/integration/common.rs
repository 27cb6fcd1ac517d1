//! Fake toolchain and project layout shared by the integration tests

use extbuild_builder::{BuildDirPolicy, ExtensionOrchestrator, ExtensionSpec};
use extbuild_config::BuildEnv;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Appends its arguments to the log. Fails while a `configure-fail-*`
/// marker remains or while the cache in the working directory is stale.
const FAKE_CMAKE: &str = r#"#!/bin/sh
PATH=/usr/bin:/bin
echo "configure $*" >> "$FAKE_STATE/log"
for marker in "$FAKE_STATE"/configure-fail-*; do
    if [ -f "$marker" ]; then
        rm -f "$marker"
        exit 1
    fi
done
if [ -f CMakeCache.txt ] && grep -q stale CMakeCache.txt; then
    exit 1
fi
echo "CMAKE_HOME_DIRECTORY=$(pwd)" > CMakeCache.txt
"#;

/// Shared by make and ninja; produces the two artifacts under swig/lib.
const FAKE_BUILD_TOOL: &str = r#"#!/bin/sh
PATH=/usr/bin:/bin
echo "build $(basename "$0") $*" >> "$FAKE_STATE/log"
if [ -f "$FAKE_STATE/build-fail" ]; then
    exit 2
fi
mkdir -p swig/lib
echo "native" > swig/lib/_ConsensusCore2.so
echo "wrapper" > swig/lib/ConsensusCore2.py
"#;

pub const ARTIFACTS: [&str; 2] = ["_ConsensusCore2.so", "ConsensusCore2.py"];

pub const CMAKE_LISTS: &str = "cmake_minimum_required(VERSION 3.2)\n\
project(ConsensusCore2 VERSION 0.13.0 LANGUAGES CXX C)\n";

/// A project checkout with a private `bin/` of fake tools
pub struct FakeProject {
    pub temp_dir: TempDir,
}

impl FakeProject {
    /// Project with fake `cmake` and `make`
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let project = Self { temp_dir };

        std::fs::create_dir_all(project.bin())?;
        std::fs::create_dir_all(project.state())?;
        std::fs::write(project.root().join("CMakeLists.txt"), CMAKE_LISTS)?;
        project.install_tool("cmake", FAKE_CMAKE)?;
        project.install_tool("make", FAKE_BUILD_TOOL)?;

        Ok(project)
    }

    /// Same as [`FakeProject::new`] plus a fake `ninja`
    pub fn with_ninja() -> Result<Self, Box<dyn std::error::Error>> {
        let project = Self::new()?;
        project.install_tool("ninja", FAKE_BUILD_TOOL)?;
        Ok(project)
    }

    pub fn install_tool(&self, name: &str, script: &str) -> std::io::Result<PathBuf> {
        let path = self.bin().join(name);
        std::fs::write(&path, script)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn bin(&self) -> PathBuf {
        self.path("tools/bin")
    }

    pub fn state(&self) -> PathBuf {
        self.path("tools/state")
    }

    pub fn dest_dir(&self) -> PathBuf {
        self.path("build/lib")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.path("build/temp")
    }

    /// Make the next `count` configure runs fail
    pub fn fail_configure(&self, count: usize) -> std::io::Result<()> {
        for n in 0..count {
            std::fs::write(self.state().join(format!("configure-fail-{n}")), "")?;
        }
        Ok(())
    }

    pub fn fail_build(&self) -> std::io::Result<()> {
        std::fs::write(self.state().join("build-fail"), "")
    }

    /// Environment snapshot whose `PATH` holds only the fake tools
    pub fn env(&self) -> BuildEnv {
        BuildEnv::from_pairs([
            ("PATH", self.bin().display().to_string()),
            ("FAKE_STATE", self.state().display().to_string()),
        ])
    }

    /// Every line the fake tools logged, in order
    pub fn log(&self) -> Vec<String> {
        std::fs::read_to_string(self.state().join("log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn configure_runs(&self) -> usize {
        self.log().iter().filter(|l| l.starts_with("configure ")).count()
    }

    pub fn build_runs(&self) -> usize {
        self.log().iter().filter(|l| l.starts_with("build ")).count()
    }

    pub fn spec(&self) -> ExtensionSpec {
        ExtensionSpec {
            source_dir: self.root().to_path_buf(),
            targets: vec!["_ConsensusCore2".to_string()],
            artifacts: ARTIFACTS.iter().map(|a| (*a).to_string()).collect(),
            artifact_subdir: PathBuf::from("swig/lib"),
        }
    }

    /// Orchestrator using the real executor and a persistent build dir
    pub fn orchestrator(&self, env: BuildEnv) -> ExtensionOrchestrator {
        ExtensionOrchestrator::new(self.spec(), env, self.root().to_path_buf())
            .with_build_dir(BuildDirPolicy::Persistent(self.build_dir()))
    }
}
