use crate::callback::{Callback, TrainingSignal};
use crate::error::Result;
use utils::{AsHistory, EpochLogs, MetricHistory};

/// Records every epoch snapshot it is handed.
#[derive(Debug, Clone, Default)]
pub struct History {
    epochs: Vec<usize>,
    history: MetricHistory,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(&self) -> &[usize] {
        &self.epochs
    }

    pub fn history(&self) -> &MetricHistory {
        &self.history
    }

    pub fn into_history(self) -> MetricHistory {
        self.history
    }
}

impl Callback for History {
    // Recording restarts with each training run.
    fn on_train_begin(&mut self) -> Result<()> {
        self.epochs.clear();
        self.history = MetricHistory::new();
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) -> Result<TrainingSignal> {
        self.epochs.push(epoch);
        self.history.push(logs);
        Ok(TrainingSignal::Continue)
    }
}

impl AsHistory for History {
    fn to_history(&self) -> MetricHistory {
        self.history.clone()
    }
}
