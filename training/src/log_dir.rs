use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::scalar_logger::ScalarLogger;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Builds `parent/task/experiment/<YYYYMMDD-HHMMSS>` log directories for
/// dashboard logging.
#[derive(Debug, Clone)]
pub struct LogDirectory {
    experiment: String,
    task: Option<String>,
    parent: Option<PathBuf>,
}

/// A created log directory together with the logging callback bound to it.
#[derive(Debug)]
pub struct ProvisionedLogDir {
    pub path: PathBuf,
    pub logger: ScalarLogger,
}

impl LogDirectory {
    pub fn new(experiment: impl Into<String>) -> Self {
        Self {
            experiment: experiment.into(),
            task: None,
            parent: None,
        }
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn parent(mut self, parent: impl AsRef<Path>) -> Self {
        self.parent = Some(parent.as_ref().to_path_buf());
        self
    }

    /// Path for `timestamp`, relative to the parent (or the current directory).
    pub fn path_at(&self, timestamp: NaiveDateTime) -> PathBuf {
        let mut path = self.parent.clone().unwrap_or_else(|| PathBuf::from("."));
        if let Some(task) = &self.task {
            path.push(task);
        }
        path.push(&self.experiment);
        path.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
        path
    }

    pub fn provision(&self) -> io::Result<ProvisionedLogDir> {
        self.provision_at(Local::now().naive_local())
    }

    /// Creates the directory for `timestamp` (and any missing parents).
    /// Succeeds when it already exists.
    pub fn provision_at(&self, timestamp: NaiveDateTime) -> io::Result<ProvisionedLogDir> {
        let path = self.path_at(timestamp);
        fs::create_dir_all(&path)?;
        let path = fs::canonicalize(&path)?;

        log::debug!("Log directory ready at {}", path.display());

        Ok(ProvisionedLogDir {
            logger: ScalarLogger::new(&path),
            path,
        })
    }
}
