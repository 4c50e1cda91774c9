use serde::Serialize;
use std::fmt;

use crate::report::{ClassificationReport, Scores};

pub const ACCURACY_COLUMN: &str = "accuracy";
pub const MACRO_AVG_COLUMN: &str = "macro avg";
pub const WEIGHTED_AVG_COLUMN: &str = "weighted avg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Precision,
    Recall,
    F1Score,
    Support,
    Accuracy,
}

impl Metric {
    /// Rows of a classification report, in report order.
    pub const REPORT_ROWS: [Metric; 4] = [
        Metric::Precision,
        Metric::Recall,
        Metric::F1Score,
        Metric::Support,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1Score => "f1-score",
            Metric::Support => "support",
            Metric::Accuracy => "accuracy",
        }
    }

    fn pick(self, scores: &Scores) -> f64 {
        match self {
            Metric::Precision => scores.precision,
            Metric::Recall => scores.recall,
            Metric::F1Score => scores.f1_score,
            Metric::Support => scores.support as f64,
            Metric::Accuracy => f64::NAN,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub metric: Metric,
    pub model: String,
    /// One entry per table column; `None` where the model's report has no
    /// such class.
    pub values: Vec<Option<f64>>,
}

/// Every model's classification report stacked into one table, one row per
/// (metric, model).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub columns: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub metric: Metric,
    pub model: String,
    pub value: f64,
}

impl ComparisonTable {
    pub fn from_reports(reports: &[(String, ClassificationReport)]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for (_, report) in reports {
            for class in &report.classes {
                if !columns.contains(&class.name) {
                    columns.push(class.name.clone());
                }
            }
        }
        columns.extend(
            [ACCURACY_COLUMN, MACRO_AVG_COLUMN, WEIGHTED_AVG_COLUMN].map(String::from),
        );

        let mut rows = Vec::with_capacity(reports.len() * Metric::REPORT_ROWS.len());
        for (model, report) in reports {
            for metric in Metric::REPORT_ROWS {
                let values = columns
                    .iter()
                    .map(|column| match column.as_str() {
                        // Accuracy is a single number, repeated on every row.
                        ACCURACY_COLUMN => Some(report.accuracy),
                        MACRO_AVG_COLUMN => Some(metric.pick(&report.macro_avg)),
                        WEIGHTED_AVG_COLUMN => Some(metric.pick(&report.weighted_avg)),
                        name => report.class(name).map(|class| metric.pick(&class.scores)),
                    })
                    .collect();

                rows.push(ComparisonRow {
                    metric,
                    model: model.clone(),
                    values,
                });
            }
        }

        Self { columns, rows }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn value(&self, metric: Metric, model: &str, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.rows
            .iter()
            .find(|row| row.metric == metric && row.model == model)
            .and_then(|row| row.values[index])
    }

    pub fn rows_for(&self, metric: Metric) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(move |row| row.metric == metric)
    }

    /// Weighted-average precision, recall and F1 plus accuracy per model,
    /// without support. Sorted by model name.
    pub fn summary(&self) -> Vec<MetricValue> {
        let weighted = self.column_index(WEIGHTED_AVG_COLUMN);
        let accuracy = self.column_index(ACCURACY_COLUMN);

        let mut summary = Vec::new();
        let mut models: Vec<&str> = Vec::new();
        for row in self.rows.iter().filter(|row| row.metric != Metric::Support) {
            if let Some(value) = weighted.and_then(|i| row.values[i]) {
                summary.push(MetricValue {
                    metric: row.metric,
                    model: row.model.clone(),
                    value,
                });
            }
            if !models.contains(&row.model.as_str()) {
                models.push(&row.model);
            }
        }

        for model in models {
            let value = self
                .rows
                .iter()
                .find(|row| row.model == model)
                .and_then(|row| accuracy.and_then(|i| row.values[i]));
            if let Some(value) = value {
                summary.push(MetricValue {
                    metric: Metric::Accuracy,
                    model: model.to_string(),
                    value,
                });
            }
        }

        summary.sort_by(|a, b| a.model.cmp(&b.model));
        summary
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:<12}", "metric", "model")?;
        for column in &self.columns {
            write!(f, " {:>12}", column)?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:<10} {:<12}", row.metric, row.model)?;
            for value in &row.values {
                match value {
                    Some(value) => write!(f, " {:>12.4}", value)?,
                    None => write!(f, " {:>12}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
