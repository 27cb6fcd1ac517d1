//! Output rendering for command results

use extbuild_builder::{BuildReport, HookReport};
use serde_json::{json, Value};
use std::io;
use std::path::PathBuf;

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render the result of a lifecycle hook
    pub fn render_report(self, report: &HookReport) -> io::Result<()> {
        if self.json_output {
            return print_json(&report_to_json(report));
        }

        match report {
            HookReport::Built(build) => render_build(build),
            HookReport::Cleaned { removed: true } => println!("Removed generated files"),
            HookReport::Cleaned { removed: false } => println!("Nothing to clean"),
            HookReport::Installed { build, installed } => {
                render_build(build);
                for path in installed {
                    println!("  installed {}", path.display());
                }
            }
        }
        Ok(())
    }

    pub fn render_version(self, version: &str) -> io::Result<()> {
        if self.json_output {
            print_json(&json!({ "version": version }))
        } else {
            println!("{version}");
            Ok(())
        }
    }
}

fn render_build(build: &BuildReport) {
    match build {
        BuildReport::Skipped => println!("Artifacts up to date, build skipped"),
        BuildReport::Built {
            generator,
            attempts,
            artifacts,
        } => {
            let retry_note = if *attempts > 1 { " after retry" } else { "" };
            println!("Built with {generator}{retry_note}");
            for path in artifacts {
                println!("  {}", path.display());
            }
        }
    }
}

fn print_json(value: &Value) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{rendered}");
    Ok(())
}

fn paths(items: &[PathBuf]) -> Vec<String> {
    items.iter().map(|p| p.display().to_string()).collect()
}

fn build_to_json(build: &BuildReport) -> Value {
    match build {
        BuildReport::Skipped => json!({ "status": "skipped" }),
        BuildReport::Built {
            generator,
            attempts,
            artifacts,
        } => json!({
            "status": "built",
            "generator": generator.to_string(),
            "attempts": attempts,
            "artifacts": paths(artifacts),
        }),
    }
}

fn report_to_json(report: &HookReport) -> Value {
    match report {
        HookReport::Built(build) => json!({ "build": build_to_json(build) }),
        HookReport::Cleaned { removed } => json!({ "clean": { "removed": removed } }),
        HookReport::Installed { build, installed } => json!({
            "build": build_to_json(build),
            "installed": paths(installed),
        }),
    }
}
