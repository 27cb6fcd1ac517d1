//! extbuild - CMake-driven native extension builds
//!
//! Thin command line front end: loads configuration, builds the lifecycle
//! hook for the requested command and renders its report.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use extbuild_builder::{
    read_project_version, split_passthrough_args, BuildHook, CleanHook, ExtensionOrchestrator,
    InstallHook, LifecycleHook, PassthroughOptions,
};
use extbuild_config::{BuildEnv, Config};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,extbuild=info";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Legacy options must go before clap sees them
    let (passthrough, args) = split_passthrough_args(std::env::args_os());
    let cli = Cli::parse_from(args);

    init_tracing(cli.global.json_logs, cli.global.log_level.as_deref());

    for flag in &passthrough.ignored {
        warn!(flag = %flag, "ignoring unsupported option");
    }

    if let Err(e) = run(cli, &passthrough).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli, passthrough: &PassthroughOptions) -> Result<(), CliError> {
    info!(command = cli.command.name(), "Starting extbuild v{}", env!("CARGO_PKG_VERSION"));

    let env = BuildEnv::capture();
    let project_dir = resolve_project_dir(cli.global.project_dir.as_deref())?;

    // Precedence: defaults < file < environment < CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref(), &project_dir).await?;
    config.merge_env(&env)?;
    apply_cli_config(&mut config, &cli.command);
    config.validate()?;
    config.anchor(&project_dir);

    let renderer = OutputRenderer::new(cli.global.json);

    match cli.command {
        Commands::Version => {
            let version = read_project_version(&config.project.cmake_lists).await?;
            renderer.render_version(&version)?;
        }
        Commands::Clean => {
            run_hook(&CleanHook::new(&config.build.output_dir), renderer).await?;
        }
        Commands::Build { .. } | Commands::BuildExt { .. } => {
            let build = prepare_build(&config, env, &project_dir, passthrough).await?;
            run_hook(&build, renderer).await?;
        }
        Commands::Install { .. } => {
            let build = prepare_build(&config, env, &project_dir, passthrough).await?;
            let install = InstallHook::new(
                build,
                CleanHook::new(&config.build.output_dir),
                &config.install.prefix,
            );
            run_hook(&install, renderer).await?;
        }
    }

    info!("Command completed successfully");
    Ok(())
}

fn resolve_project_dir(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    let cwd = std::env::current_dir()?;
    let Some(dir) = explicit else {
        return Ok(cwd);
    };

    let dir = cwd.join(dir);
    if !dir.is_dir() {
        return Err(CliError::InvalidArguments(format!(
            "project directory {} does not exist",
            dir.display()
        )));
    }
    Ok(dir)
}

/// Apply command-line flags on top of file and environment configuration
fn apply_cli_config(config: &mut Config, command: &Commands) {
    if let Some(args) = command.build_args() {
        if args.no_ninja {
            config.build.prefer_ninja = false;
        }
        if let Some(dir) = &args.build_dir {
            config.build.build_dir.clone_from(dir);
            config.build.ephemeral = false;
        }
        if args.ephemeral {
            config.build.ephemeral = true;
        }
        if let Some(dir) = &args.dest_dir {
            config.build.dest_dir.clone_from(dir);
        }
    }

    match command {
        Commands::BuildExt { inplace: true, .. } => {
            config.build.dest_dir.clone_from(&config.project.source_dir);
        }
        Commands::Install {
            prefix: Some(prefix),
            ..
        } => {
            config.install.prefix.clone_from(prefix);
        }
        _ => {}
    }
}

/// Check the project version, then assemble the build hook
async fn prepare_build(
    config: &Config,
    env: BuildEnv,
    project_dir: &Path,
    passthrough: &PassthroughOptions,
) -> Result<BuildHook, CliError> {
    let version = read_project_version(&config.project.cmake_lists).await?;
    info!(version = %version, "project version");

    let mut orchestrator = ExtensionOrchestrator::from_config(config, env, project_dir.to_path_buf());
    passthrough.apply(orchestrator.overrides_mut());

    Ok(BuildHook::new(orchestrator, &config.build.dest_dir))
}

async fn run_hook(hook: &dyn LifecycleHook, renderer: OutputRenderer) -> Result<(), CliError> {
    info!(hook = hook.name(), "running hook");
    let report = hook.run().await?;
    renderer.render_report(&report)?;
    Ok(())
}

/// Resolve the log filter: `RUST_LOG`, then `--log-level`, then the default
fn log_filter(log_level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directives = match log_level {
        Some(level) if level.contains('=') || level.contains(',') => level.to_string(),
        Some(level) => format!("warn,extbuild={level}"),
        None => DEFAULT_LOG_FILTER.to_string(),
    };

    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter `{directives}`: {e}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

/// Initialize tracing/logging on stderr; stdout is left to command output
fn init_tracing(json_logs: bool, log_level: Option<&str>) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(log_level));

    if json_logs {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}
