use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Metrics reported for a single epoch, keyed by metric name.
///
/// Hosts build a fresh map for every epoch and hand it to callbacks by reference.
pub type EpochLogs = BTreeMap<String, f64>;

/// Per-epoch metric values, one column per metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricHistory {
    columns: BTreeMap<String, Vec<f64>>,
}

impl MetricHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every metric of one epoch snapshot to its column.
    pub fn push(&mut self, logs: &EpochLogs) {
        for (name, value) in logs {
            self.columns.entry(name.clone()).or_default().push(*value);
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.columns.insert(name.into(), values);
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the requested columns that are present, in request order.
    /// Missing names are skipped.
    pub fn select<'a, S: AsRef<str>>(&'a self, names: &[S]) -> Vec<(&'a str, &'a [f64])> {
        names
            .iter()
            .filter_map(|name| {
                self.columns
                    .get_key_value(name.as_ref())
                    .map(|(key, values)| (key.as_str(), values.as_slice()))
            })
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of recorded epochs (length of the longest column).
    pub fn epochs(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<BTreeMap<String, Vec<f64>>> for MetricHistory {
    fn from(columns: BTreeMap<String, Vec<f64>>) -> Self {
        Self { columns }
    }
}

impl From<HashMap<String, Vec<f64>>> for MetricHistory {
    fn from(columns: HashMap<String, Vec<f64>>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }
}

/// Anything that can hand out a metric history: a raw mapping, a recorded
/// history, or a trained model that kept one.
pub trait AsHistory {
    fn to_history(&self) -> MetricHistory;
}

impl AsHistory for MetricHistory {
    fn to_history(&self) -> MetricHistory {
        self.clone()
    }
}

impl AsHistory for BTreeMap<String, Vec<f64>> {
    fn to_history(&self) -> MetricHistory {
        MetricHistory::from(self.clone())
    }
}

impl AsHistory for HashMap<String, Vec<f64>> {
    fn to_history(&self) -> MetricHistory {
        MetricHistory::from(self.clone())
    }
}

impl<T: AsHistory + ?Sized> AsHistory for &T {
    fn to_history(&self) -> MetricHistory {
        (**self).to_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logs(pairs: &[(&str, f64)]) -> EpochLogs {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_push_appends_per_column() {
        let mut history = MetricHistory::new();
        history.push(&logs(&[("loss", 0.9), ("val_loss", 1.0)]));
        history.push(&logs(&[("loss", 0.7), ("val_loss", 0.8)]));

        assert_eq!(history.column("loss"), Some(&[0.9, 0.7][..]));
        assert_eq!(history.column("val_loss"), Some(&[1.0, 0.8][..]));
        assert_eq!(history.epochs(), 2);
    }

    #[test]
    fn test_select_skips_missing_columns() {
        let mut history = MetricHistory::new();
        history.insert("loss", vec![1.0, 0.5]);
        history.insert("accuracy", vec![0.4, 0.6]);

        let selected = history.select(&["loss", "val_loss"]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0, "loss");

        let selected = history.select(&["accuracy", "loss"]);
        let names: Vec<_> = selected.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["accuracy", "loss"]);
    }

    #[test]
    fn test_raw_mappings_convert() {
        let mut raw = HashMap::new();
        raw.insert("loss".to_string(), vec![3.0, 2.0, 1.0]);

        let history = raw.to_history();
        assert_eq!(history.epochs(), 3);
        assert!(history.contains("loss"));
    }

    #[test]
    fn test_json_shape_is_plain_mapping() {
        let mut history = MetricHistory::new();
        history.insert("loss", vec![0.5]);

        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"{"loss":[0.5]}"#);

        let back: MetricHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
