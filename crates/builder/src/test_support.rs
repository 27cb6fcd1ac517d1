//! Scripted executor for unit tests

use crate::runner::{CommandExecutor, Invocation};
use async_trait::async_trait;
use extbuild_errors::Error;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

/// Records every invocation and answers with queued exit codes.
///
/// Calls whose program equals `configure_program` are configure steps,
/// everything else is a build step. Empty queues answer `Some(0)`. A
/// successful build step writes `artifacts` (relative to its cwd).
pub(crate) struct ScriptedExecutor {
    configure_program: PathBuf,
    configure_exits: Mutex<VecDeque<Option<i32>>>,
    build_exits: Mutex<VecDeque<Option<i32>>>,
    artifacts: Vec<PathBuf>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    pub(crate) fn new(configure_program: impl Into<PathBuf>) -> Self {
        Self {
            configure_program: configure_program.into(),
            configure_exits: Mutex::new(VecDeque::new()),
            build_exits: Mutex::new(VecDeque::new()),
            artifacts: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn configure_exits(self, exits: impl IntoIterator<Item = Option<i32>>) -> Self {
        self.configure_exits.lock().unwrap().extend(exits);
        self
    }

    pub(crate) fn build_exits(self, exits: impl IntoIterator<Item = Option<i32>>) -> Self {
        self.build_exits.lock().unwrap().extend(exits);
        self
    }

    pub(crate) fn producing(mut self, artifacts: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.artifacts = artifacts.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn configure_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.program == self.configure_program)
            .count()
    }

    pub(crate) fn build_count(&self) -> usize {
        self.calls().len() - self.configure_count()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, invocation: &Invocation) -> Result<Option<i32>, Error> {
        self.calls.lock().unwrap().push(invocation.clone());

        let is_configure = invocation.program == self.configure_program;
        let queue = if is_configure {
            &self.configure_exits
        } else {
            &self.build_exits
        };
        let exit = queue.lock().unwrap().pop_front().unwrap_or(Some(0));

        if !invocation.cwd.is_dir() {
            return Ok(exit);
        }

        if is_configure {
            // Leave a cache behind the way CMake does.
            std::fs::write(invocation.cwd.join("CMakeCache.txt"), "cache")?;
        } else if exit == Some(0) {
            for artifact in &self.artifacts {
                let path = invocation.cwd.join(artifact);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, artifact.display().to_string())?;
            }
        }

        Ok(exit)
    }
}
