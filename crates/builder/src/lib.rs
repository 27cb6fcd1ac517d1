#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! Native extension builds driven through CMake
//!
//! This crate locates the toolchain, assembles CMake definitions from an
//! environment snapshot, picks a generator, runs the configure and build
//! steps, and relocates the resulting artifacts for packaging.

mod build_dir;
mod definitions;
mod generator;
pub mod hooks;
mod orchestrator;
mod passthrough;
mod runner;
mod toolchain;
mod version;

#[cfg(test)]
mod test_support;

pub use build_dir::BuildDirectory;
pub use definitions::{BuildType, Definitions, Overrides};
pub use generator::{GeneratorChoice, GeneratorKind};
pub use hooks::{BuildHook, CleanHook, HookReport, InstallHook, LifecycleHook};
pub use orchestrator::{BuildDirPolicy, BuildReport, ExtensionOrchestrator, ExtensionSpec};
pub use passthrough::{split_passthrough_args, PassthroughOptions};
pub use runner::{BuildOutcome, BuildRunner, CommandExecutor, Invocation, SystemExecutor};
pub use toolchain::{Tool, ToolchainLocator, CMAKE, NINJA};
pub use version::{parse_project_version, read_project_version};
