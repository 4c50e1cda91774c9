use crate::error::Result;
use utils::EpochLogs;

/// What the host loop should do after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainingSignal {
    #[default]
    Continue,
    Stop,
}

impl TrainingSignal {
    pub fn should_stop(self) -> bool {
        self == TrainingSignal::Stop
    }

    fn merge(self, other: TrainingSignal) -> TrainingSignal {
        if self.should_stop() || other.should_stop() {
            TrainingSignal::Stop
        } else {
            TrainingSignal::Continue
        }
    }
}

/// Lifecycle hooks invoked synchronously by a training loop.
pub trait Callback {
    fn on_train_begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) -> Result<TrainingSignal>;

    fn on_train_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Fans every hook out to all registered callbacks, in registration order.
#[derive(Default)]
pub struct CallbackList<'a> {
    callbacks: Vec<&'a mut dyn Callback>,
}

impl<'a> CallbackList<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, callback: &'a mut dyn Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn push(&mut self, callback: &'a mut dyn Callback) {
        self.callbacks.push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl Callback for CallbackList<'_> {
    fn on_train_begin(&mut self) -> Result<()> {
        for callback in self.callbacks.iter_mut() {
            callback.on_train_begin()?;
        }
        Ok(())
    }

    // Every callback sees every epoch, even after one of them asked to stop.
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) -> Result<TrainingSignal> {
        let mut signal = TrainingSignal::Continue;
        for callback in self.callbacks.iter_mut() {
            signal = signal.merge(callback.on_epoch_end(epoch, logs)?);
        }
        Ok(signal)
    }

    fn on_train_end(&mut self) -> Result<()> {
        for callback in self.callbacks.iter_mut() {
            callback.on_train_end()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StopAt {
        epoch: usize,
        seen: Vec<usize>,
    }

    impl Callback for StopAt {
        fn on_epoch_end(&mut self, epoch: usize, _logs: &EpochLogs) -> Result<TrainingSignal> {
            self.seen.push(epoch);
            if epoch >= self.epoch {
                Ok(TrainingSignal::Stop)
            } else {
                Ok(TrainingSignal::Continue)
            }
        }
    }

    #[test]
    fn test_any_stop_stops_and_all_callbacks_run() {
        let mut early = StopAt {
            epoch: 1,
            seen: Vec::new(),
        };
        let mut late = StopAt {
            epoch: 10,
            seen: Vec::new(),
        };

        {
            let mut list = CallbackList::new().with(&mut early).with(&mut late);
            let logs = EpochLogs::new();
            assert_eq!(list.on_epoch_end(0, &logs).unwrap(), TrainingSignal::Continue);
            assert_eq!(list.on_epoch_end(1, &logs).unwrap(), TrainingSignal::Stop);
        }

        assert_eq!(early.seen, vec![0, 1]);
        assert_eq!(late.seen, vec![0, 1]);
    }

    #[test]
    fn test_empty_list_continues() {
        let mut list = CallbackList::new();
        assert!(list.is_empty());
        let signal = list.on_epoch_end(0, &EpochLogs::new()).unwrap();
        assert!(!signal.should_stop());
    }
}
