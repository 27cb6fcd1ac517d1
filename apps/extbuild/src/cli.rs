//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// extbuild - CMake-driven native extension builds
#[derive(Parser)]
#[command(name = "extbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, install and clean CMake-based native extensions")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Log filter, e.g. `debug` or `extbuild=trace` (overridden by `RUST_LOG`)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

/// Options shared by every command that builds
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Always use Make, even when Ninja is available
    #[arg(long)]
    pub no_ninja: bool,

    /// Persistent build directory
    #[arg(long, value_name = "DIR", conflicts_with = "ephemeral")]
    pub build_dir: Option<PathBuf>,

    /// Build in a temporary directory removed afterwards
    #[arg(long)]
    pub ephemeral: bool,

    /// Destination package directory for the artifacts
    #[arg(long, value_name = "DIR")]
    pub dest_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build the extension and place its artifacts in the package directory
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Build only the native extension
    #[command(name = "build-ext", alias = "build_ext")]
    BuildExt {
        #[command(flatten)]
        args: BuildArgs,

        /// Put the artifacts next to the sources instead of the package directory
        #[arg(short, long, conflicts_with = "dest_dir")]
        inplace: bool,
    },

    /// Build, copy the artifacts into the install prefix, then clean
    Install {
        #[command(flatten)]
        args: BuildArgs,

        /// Install prefix
        #[arg(long, value_name = "DIR")]
        prefix: Option<PathBuf>,
    },

    /// Remove the generated output tree
    Clean,

    /// Print the project version declared in CMakeLists.txt
    Version,
}

impl Commands {
    /// Name used in log messages
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Build { .. } => "build",
            Commands::BuildExt { .. } => "build-ext",
            Commands::Install { .. } => "install",
            Commands::Clean => "clean",
            Commands::Version => "version",
        }
    }

    /// Build options for commands that run the configure/build sequence
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match self {
            Commands::Build { args }
            | Commands::BuildExt { args, .. }
            | Commands::Install { args, .. } => Some(args),
            Commands::Clean | Commands::Version => None,
        }
    }
}
