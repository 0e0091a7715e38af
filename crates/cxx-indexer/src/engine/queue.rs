use std::collections::VecDeque;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::frontend::BuildConfig;

/// A registered source file and every configuration it is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub path: PathBuf,
    #[serde(default)]
    pub builds: Vec<BuildConfig>,
}

impl Unit {
    pub fn new(
        path: PathBuf,
        builds: Vec<BuildConfig>,
    ) -> Self {
        Self {
            path,
            builds,
        }
    }
}

/// "Reparse this path with these configurations."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexJob {
    pub path: PathBuf,
    pub builds: Vec<BuildConfig>,
}

impl IndexJob {
    pub fn new(
        path: PathBuf,
        builds: Vec<BuildConfig>,
    ) -> Self {
        Self {
            path,
            builds,
        }
    }

    /// A job with no configuration still parses once with the default one.
    pub fn effective_builds(&self) -> Vec<BuildConfig> {
        if self.builds.is_empty() {
            vec![BuildConfig::default()]
        } else {
            self.builds.clone()
        }
    }
}

/// FIFO of pending jobs. Duplicate paths are kept; each one reparses.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<IndexJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        job: IndexJob,
    ) {
        self.jobs.push_back(job);
    }

    pub fn pop(&mut self) -> Option<IndexJob> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
