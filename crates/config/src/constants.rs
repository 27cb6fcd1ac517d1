//! Environment variable names understood by the orchestrator

pub const CMAKE_COMMAND: &str = "CMAKE_COMMAND";
pub const NINJA_COMMAND: &str = "NINJA_COMMAND";
pub const CMAKE_SKIP_RPATH: &str = "CMAKE_SKIP_RPATH";
pub const CMAKE_BUILD_TYPE: &str = "CMAKE_BUILD_TYPE";
pub const VERBOSE: &str = "VERBOSE";
pub const PATH: &str = "PATH";

pub const EXTBUILD_BUILD_DIR: &str = "EXTBUILD_BUILD_DIR";
pub const EXTBUILD_PREFER_NINJA: &str = "EXTBUILD_PREFER_NINJA";

/// Keys copied verbatim from the environment into CMake definitions.
/// `CMAKE_BUILD_TYPE` is handled separately because it is validated.
pub const DEFINITION_ALLOW_LIST: &[&str] = &[
    "Boost_INCLUDE_DIRS",
    "PYTHON_INCLUDE_DIRS",
    "pbcopper_INCLUDE_DIRS",
    "pbcopper_LIBRARIES",
    "GIT_EXECUTABLE",
    "SWIG_COMMAND",
    "UNY_use_ccache",
];

/// Default name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "extbuild.toml";
