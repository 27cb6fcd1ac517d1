//! Builds driven by `extbuild.toml` and the environment snapshot

use super::common::{FakeProject, CMAKE_LISTS};
use extbuild_builder::{
    read_project_version, BuildHook, BuildReport, ExtensionOrchestrator, HookReport, LifecycleHook,
};
use extbuild_config::Config;
use extbuild_errors::{BuildError, ConfigError, Error};

const PROJECT_CONFIG: &str = r#"
[build]
prefer_ninja = false
python_executable = "/usr/bin/python3.11"

[extension]
targets = ["_ConsensusCore2"]
artifacts = ["_ConsensusCore2.so"]

[definitions]
UNY_use_ccache = "ON"
"#;

async fn load_config(project: &FakeProject) -> Result<Config, Error> {
    let mut config = Config::load(project.root()).await?;
    config.merge_env(&project.env())?;
    config.validate()?;
    config.anchor(project.root());
    Ok(config)
}

#[tokio::test]
async fn test_config_file_drives_build() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::with_ninja()?;
    std::fs::write(project.path("extbuild.toml"), PROJECT_CONFIG)?;
    let config = load_config(&project).await?;

    let orchestrator =
        ExtensionOrchestrator::from_config(&config, project.env(), project.root().to_path_buf());
    let hook = BuildHook::new(orchestrator, &config.build.dest_dir);
    let report = hook.run().await?;

    assert!(matches!(
        report,
        HookReport::Built(BuildReport::Built { ref artifacts, .. }) if artifacts.len() == 1
    ));
    assert!(project.dest_dir().join("_ConsensusCore2.so").is_file());
    assert!(!project.dest_dir().join("ConsensusCore2.py").exists());

    let configure = &project.log()[0];
    assert!(configure.contains("-GUnix Makefiles"));
    assert!(configure.contains("-DPYTHON_EXECUTABLE=/usr/bin/python3.11"));
    assert!(configure.contains("-DUNY_use_ccache=ON"));
    Ok(())
}

#[tokio::test]
async fn test_environment_overrides_file() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    std::fs::write(project.path("extbuild.toml"), PROJECT_CONFIG)?;

    let mut config = Config::load(project.root()).await?;
    let env = project
        .env()
        .merged([("EXTBUILD_BUILD_DIR", "out/cmake"), ("EXTBUILD_PREFER_NINJA", "on")]);
    config.merge_env(&env)?;
    config.anchor(project.root());

    assert!(config.build.prefer_ninja);
    assert_eq!(config.build.build_dir, project.path("out/cmake"));

    let unparseable = env.merged([("EXTBUILD_PREFER_NINJA", "sometimes")]);
    assert!(config.merge_env(&unparseable).is_err());
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    std::fs::write(project.path("extbuild.toml"), "[extension]\nartifacts = []\n")?;

    let err = load_config(&project).await.unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Invalid { .. })));
    Ok(())
}

#[tokio::test]
async fn test_project_version() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    let config = load_config(&project).await?;
    assert_eq!(read_project_version(&config.project.cmake_lists).await?, "0.13.0");

    std::fs::write(
        project.path("CMakeLists.txt"),
        CMAKE_LISTS.replace("VERSION 0.13.0", "VERSION 0.13"),
    )?;
    let err = read_project_version(&config.project.cmake_lists)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Build(BuildError::VersionStringNotFound { .. })
    ));
    Ok(())
}
