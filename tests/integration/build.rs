//! Configure/build sequence against the fake toolchain

use super::common::{FakeProject, ARTIFACTS};
use extbuild_builder::{BuildDirPolicy, BuildReport, GeneratorKind};
use extbuild_errors::{BuildError, Error};

#[tokio::test]
async fn test_build_with_make() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    let report = project
        .orchestrator(project.env())
        .with_prefer_ninja(false)
        .build(&project.dest_dir())
        .await?;

    assert!(matches!(
        report,
        BuildReport::Built {
            generator: GeneratorKind::Make,
            attempts: 1,
            ..
        }
    ));
    for artifact in ARTIFACTS {
        assert!(project.dest_dir().join(artifact).is_file());
    }

    let log = project.log();
    assert_eq!(log.len(), 2);
    assert!(log[0].contains("-GUnix Makefiles"));
    assert!(log[0].contains("-DCMAKE_BUILD_TYPE=RelWithDebInfo"));
    assert!(log[0].ends_with(&project.root().display().to_string()));
    assert_eq!(log[1], "build make _ConsensusCore2");
    Ok(())
}

#[tokio::test]
async fn test_ninja_preferred_when_available() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::with_ninja()?;
    let env = project.env().merged([("VERBOSE", "1")]);
    let report = project.orchestrator(env).build(&project.dest_dir()).await?;

    assert!(matches!(
        report,
        BuildReport::Built {
            generator: GeneratorKind::Ninja,
            ..
        }
    ));
    let log = project.log();
    assert!(log[0].contains("-GNinja"));
    assert_eq!(log[1], "build ninja -v _ConsensusCore2");
    Ok(())
}

#[tokio::test]
async fn test_environment_definitions_reach_cmake() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    let env = project.env().merged([
        ("CMAKE_BUILD_TYPE", "Debug"),
        ("Boost_INCLUDE_DIRS", "/opt/boost/include"),
        ("CMAKE_SKIP_RPATH", "yes"),
        ("PYTHON_SWIG", "0"),
    ]);
    project.orchestrator(env).build(&project.dest_dir()).await?;

    let configure = &project.log()[0];
    assert!(configure.contains("-DCMAKE_BUILD_TYPE=Debug"));
    assert!(configure.contains("-DBoost_INCLUDE_DIRS=/opt/boost/include"));
    assert!(configure.contains("-DCMAKE_SKIP_RPATH=TRUE"));
    // Not allow-listed; the fixed override stands
    assert!(configure.contains("-DPYTHON_SWIG=1"));
    Ok(())
}

#[tokio::test]
async fn test_stale_cache_is_purged_and_retried() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    std::fs::create_dir_all(project.build_dir())?;
    std::fs::write(project.build_dir().join("CMakeCache.txt"), "stale")?;

    let report = project
        .orchestrator(project.env())
        .build(&project.dest_dir())
        .await?;

    assert!(matches!(report, BuildReport::Built { attempts: 2, .. }));
    assert_eq!(project.configure_runs(), 2);
    assert_eq!(project.build_runs(), 1);
    let cache = std::fs::read_to_string(project.build_dir().join("CMakeCache.txt"))?;
    assert!(!cache.contains("stale"));
    Ok(())
}

#[tokio::test]
async fn test_repeated_configure_failure_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    project.fail_configure(2)?;

    let err = project
        .orchestrator(project.env())
        .build(&project.dest_dir())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Build(BuildError::ConfigureFailed { exit_code: Some(1) })
    ));
    assert_eq!(project.configure_runs(), 2);
    assert_eq!(project.build_runs(), 0);
    Ok(())
}

#[tokio::test]
async fn test_build_failure_is_not_retried() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    project.fail_build()?;

    let err = project
        .orchestrator(project.env())
        .build(&project.dest_dir())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Build(BuildError::BuildFailed { exit_code: Some(2) })
    ));
    assert_eq!(project.configure_runs(), 1);
    assert_eq!(project.build_runs(), 1);
    assert!(!project.dest_dir().join(ARTIFACTS[0]).exists());
    Ok(())
}

#[tokio::test]
async fn test_second_build_spawns_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    let orchestrator = project.orchestrator(project.env());

    orchestrator.build(&project.dest_dir()).await?;
    let runs = project.log().len();
    let report = orchestrator.build(&project.dest_dir()).await?;

    assert_eq!(report, BuildReport::Skipped);
    assert_eq!(project.log().len(), runs);
    Ok(())
}

#[tokio::test]
async fn test_cmake_command_override() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    let cmake = project.bin().join("cmake");
    let renamed = project.path("tools/cmake-3.28");
    std::fs::rename(&cmake, &renamed)?;

    let missing = project
        .orchestrator(project.env())
        .build(&project.dest_dir())
        .await
        .unwrap_err();
    assert!(missing.to_string().contains("CMAKE_COMMAND"));
    assert!(project.log().is_empty());

    let env = project
        .env()
        .merged([("CMAKE_COMMAND", renamed.display().to_string())]);
    project.orchestrator(env).build(&project.dest_dir()).await?;
    assert_eq!(project.configure_runs(), 1);
    Ok(())
}

#[tokio::test]
async fn test_ephemeral_build_leaves_no_directory() -> Result<(), Box<dyn std::error::Error>> {
    let project = FakeProject::new()?;
    let scratch = project.path("scratch");

    project
        .orchestrator(project.env())
        .with_build_dir(BuildDirPolicy::Ephemeral(Some(scratch.clone())))
        .build(&project.dest_dir())
        .await?;

    assert!(project.dest_dir().join(ARTIFACTS[1]).is_file());
    assert_eq!(std::fs::read_dir(&scratch)?.count(), 0);
    Ok(())
}
