use serde::{Deserialize, Serialize};

use crate::callback::{Callback, TrainingSignal};
use crate::error::{CallbackError, Result};
use utils::EpochLogs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyStoppingConfig {
    /// Metric compared between consecutive epochs. Lower is better.
    pub monitor: String,
    /// Smallest decrease that still counts as an improvement.
    pub min_change: f64,
    /// Non-improving epochs tolerated before stopping (see [`EarlyStopping`]).
    pub patience: usize,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        Self {
            monitor: "loss".to_string(),
            min_change: 0.0,
            patience: 0,
        }
    }
}

/// Stops training once the monitored metric stops decreasing.
///
/// Each epoch is compared against the previous one (not the best so far).
/// The counter is checked before it is incremented, so `patience + 1`
/// non-improving epochs in a row are tolerated and the next one stops.
/// A NaN value never compares below `min_change`, so it resets the counter
/// and a diverged run does not stop on its own.
///
/// The logs passed to [`Callback::on_epoch_end`] must contain the monitored
/// metric; otherwise [`CallbackError::MissingMetric`] is returned.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    monitor: String,
    min_change: f64,
    patience: usize,
    last_value: Option<f64>,
    num_no_improvement: usize,
    stopped_epoch: Option<usize>,
}

impl EarlyStopping {
    pub fn new(monitor: impl Into<String>, min_change: f64, patience: usize) -> Self {
        Self {
            monitor: monitor.into(),
            min_change: min_change.max(0.0),
            patience,
            last_value: None,
            num_no_improvement: 0,
            stopped_epoch: None,
        }
    }

    pub fn from_config(config: &EarlyStoppingConfig) -> Self {
        Self::new(config.monitor.clone(), config.min_change, config.patience)
    }

    pub fn monitor(&self) -> &str {
        &self.monitor
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    pub fn num_no_improvement(&self) -> usize {
        self.num_no_improvement
    }

    /// First epoch at which a stop was signalled, if any.
    pub fn stopped_epoch(&self) -> Option<usize> {
        self.stopped_epoch
    }

    fn update(&mut self, epoch: usize, current: f64) -> TrainingSignal {
        let Some(last) = self.last_value.replace(current) else {
            log::info!("change: 0 num_no_improv: 0");
            return TrainingSignal::Continue;
        };

        let change = last - current;
        log::info!(
            "change: {:.4} num_no_improv: {}",
            change,
            self.num_no_improvement
        );

        if change < self.min_change {
            if self.num_no_improvement > self.patience {
                if self.stopped_epoch.is_none() {
                    log::info!("Early stopping at epoch {}", epoch);
                    self.stopped_epoch = Some(epoch);
                }
                return TrainingSignal::Stop;
            }
            self.num_no_improvement += 1;
        } else {
            self.num_no_improvement = 0;
        }

        TrainingSignal::Continue
    }
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self::from_config(&EarlyStoppingConfig::default())
    }
}

impl Callback for EarlyStopping {
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) -> Result<TrainingSignal> {
        let current = *logs
            .get(&self.monitor)
            .ok_or_else(|| CallbackError::MissingMetric(self.monitor.clone()))?;

        Ok(self.update(epoch, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(monitor: &mut EarlyStopping, values: &[f64]) -> Option<usize> {
        for (epoch, value) in values.iter().enumerate() {
            let mut logs = EpochLogs::new();
            logs.insert("loss".to_string(), *value);
            if monitor.on_epoch_end(epoch, &logs).unwrap().should_stop() {
                return Some(epoch);
            }
        }
        None
    }

    #[test]
    fn test_first_epoch_only_records_baseline() {
        let mut monitor = EarlyStopping::default();
        assert_eq!(run(&mut monitor, &[5.0]), None);
        assert_eq!(monitor.last_value(), Some(5.0));
        assert_eq!(monitor.num_no_improvement(), 0);
    }

    #[test]
    fn test_zero_patience_tolerates_one_bad_epoch() {
        let mut monitor = EarlyStopping::new("loss", 0.0, 0);
        // Epoch 1 is the first regression, epoch 2 the second.
        assert_eq!(run(&mut monitor, &[1.0, 1.1, 1.2, 1.3]), Some(2));
        assert_eq!(monitor.stopped_epoch(), Some(2));
    }

    #[test]
    fn test_patience_two_stops_on_fourth_regression() {
        let mut monitor = EarlyStopping::new("loss", 0.0, 2);
        let values = [1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6];
        assert_eq!(run(&mut monitor, &values), Some(4));
    }

    #[test]
    fn test_improvement_resets_counter() {
        let mut monitor = EarlyStopping::new("loss", 0.0, 1);
        assert_eq!(run(&mut monitor, &[1.0, 1.1, 1.2, 0.5]), None);
        assert_eq!(monitor.num_no_improvement(), 0);
    }

    #[test]
    fn test_small_improvement_below_min_change_counts_as_none() {
        let mut monitor = EarlyStopping::new("loss", 0.1, 0);
        assert_eq!(run(&mut monitor, &[1.0, 0.95, 0.9]), Some(2));
    }

    #[test]
    fn test_nan_resets_counter() {
        let mut monitor = EarlyStopping::new("loss", 0.0, 0);
        assert_eq!(run(&mut monitor, &[1.0, 1.1, f64::NAN, f64::NAN, f64::NAN]), None);
        assert_eq!(monitor.num_no_improvement(), 0);
    }

    #[test]
    fn test_equal_values_count_as_improvement_with_zero_min_change() {
        let mut monitor = EarlyStopping::new("loss", 0.0, 0);
        assert_eq!(run(&mut monitor, &[1.0, 1.0, 1.0, 1.0]), None);
        assert_eq!(monitor.num_no_improvement(), 0);
    }

    #[test]
    fn test_compares_against_previous_epoch_not_best() {
        let mut monitor = EarlyStopping::new("loss", 0.0, 0);
        // 1.5 -> 1.2 improves on the previous epoch even though 1.0 was best.
        assert_eq!(run(&mut monitor, &[1.0, 1.5, 1.2, 1.1]), None);
    }

    #[test]
    fn test_missing_metric_is_reported() {
        let mut monitor = EarlyStopping::new("val_loss", 0.0, 0);
        let mut logs = EpochLogs::new();
        logs.insert("loss".to_string(), 1.0);

        let err = monitor.on_epoch_end(0, &logs).unwrap_err();
        assert!(matches!(err, CallbackError::MissingMetric(name) if name == "val_loss"));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: EarlyStoppingConfig = serde_json::from_str(r#"{"patience": 3}"#).unwrap();
        assert_eq!(config.monitor, "loss");
        assert_eq!(config.patience, 3);

        let monitor = EarlyStopping::from_config(&config);
        assert_eq!(monitor.monitor(), "loss");
    }

    proptest! {
        #[test]
        fn prop_worsening_run_eventually_stops(
            start in 0.0f64..10.0,
            steps in prop::collection::vec(0.001f64..1.0, 1..40),
            patience in 0usize..10,
        ) {
            prop_assume!(steps.len() > patience + 1);

            let mut values = vec![start];
            for step in &steps {
                let last = *values.last().unwrap();
                values.push(last + step);
            }

            let mut monitor = EarlyStopping::new("loss", 0.0, patience);
            prop_assert_eq!(run(&mut monitor, &values), Some(patience + 2));
        }

        #[test]
        fn prop_improving_run_never_stops(
            start in 0.0f64..10.0,
            steps in prop::collection::vec(0.001f64..1.0, 1..40),
            patience in 0usize..5,
        ) {
            let mut values = vec![start];
            for step in &steps {
                let last = *values.last().unwrap();
                values.push(last - step);
            }

            let mut monitor = EarlyStopping::new("loss", 0.0, patience);
            prop_assert_eq!(run(&mut monitor, &values), None);
            prop_assert_eq!(monitor.num_no_improvement(), 0);
        }
    }
}
