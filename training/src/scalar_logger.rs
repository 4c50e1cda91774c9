use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::callback::{Callback, TrainingSignal};
use crate::error::Result;
use utils::EpochLogs;

const SCALARS_FILE: &str = "scalars.jsonl";

#[derive(Serialize)]
struct ScalarEvent<'a> {
    epoch: usize,
    wall_time: f64,
    scalars: &'a EpochLogs,
}

/// Appends one JSON line per epoch to `<dir>/scalars.jsonl` for dashboards.
#[derive(Debug)]
pub struct ScalarLogger {
    dir: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl ScalarLogger {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            writer: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(SCALARS_FILE)
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.file_path())?;
                BufWriter::new(file)
            }
        };
        Ok(self.writer.insert(writer))
    }
}

impl Callback for ScalarLogger {
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) -> Result<TrainingSignal> {
        let event = ScalarEvent {
            epoch,
            wall_time: Utc::now().timestamp_millis() as f64 / 1000.0,
            scalars: logs,
        };

        let writer = self.writer()?;
        serde_json::to_writer(&mut *writer, &event)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(TrainingSignal::Continue)
    }

    fn on_train_end(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
