use candle_core::{Module, Tensor};
use serde::Serialize;

use crate::dataset::LabeledData;
use crate::error::{EvaluationError, Result};
use crate::normalize::{label_scores, normalize, to_hard_label, to_probability_column};
use crate::report::ClassificationReport;
use crate::table::{ComparisonTable, MetricValue};

/// The models to compare.
pub enum Models<'m> {
    /// Positional models. Names default to `model_1`, `model_2`, ...
    Sequence {
        models: Vec<&'m dyn Module>,
        names: Option<Vec<String>>,
    },
    /// Models keyed by an explicit name.
    Mapping(Vec<(String, &'m dyn Module)>),
}

impl<'m> Models<'m> {
    pub fn unnamed(models: Vec<&'m dyn Module>) -> Self {
        Models::Sequence {
            models,
            names: None,
        }
    }

    pub fn named(models: Vec<&'m dyn Module>, names: Vec<String>) -> Self {
        Models::Sequence {
            models,
            names: Some(names),
        }
    }

    fn into_registry(self) -> Result<Vec<(String, Option<&'m dyn Module>)>> {
        let registry: Vec<_> = match self {
            Models::Sequence { models, names } => resolve_names(names, models.len())?
                .into_iter()
                .zip(models.into_iter().map(Some))
                .collect(),
            Models::Mapping(models) => models
                .into_iter()
                .map(|(name, model)| (name, Some(model)))
                .collect(),
        };

        ensure_unique(registry.iter().map(|(name, _)| name.as_str()))?;
        Ok(registry)
    }
}

/// Normalized output of one model.
#[derive(Debug, Clone)]
pub struct ModelPredictions {
    /// `(samples, 1)` positive-class scores or `(samples, classes)`.
    pub probabilities: Tensor,
    pub labels: Vec<u32>,
    pub scores: Vec<f32>,
}

impl ModelPredictions {
    fn from_raw(model: &str, raw: &Tensor, expected: usize) -> Result<Self> {
        let probabilities = to_probability_column(&normalize(raw)?)?;
        let predictions = probabilities.dim(0)?;
        if predictions != expected {
            return Err(EvaluationError::LengthMismatch {
                model: model.to_string(),
                predictions,
                labels: expected,
            });
        }

        Ok(Self {
            labels: to_hard_label(&probabilities)?,
            scores: label_scores(&probabilities)?,
            probabilities,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricComparison {
    pub table: ComparisonTable,
    /// Plot-ready `(metric, model, value)` rows; see [`ComparisonTable::summary`].
    pub summary: Vec<MetricValue>,
}

/// Compares several classifiers (or their saved predictions) on one
/// labelled dataset.
pub struct PerformanceComparer<'m, D: LabeledData> {
    models: Vec<(String, Option<&'m dyn Module>)>,
    data: &'m D,
    class_names: Option<Vec<String>>,
    predictions: Option<Vec<ModelPredictions>>,
    comparison: Option<MetricComparison>,
}

impl<'m, D: LabeledData> PerformanceComparer<'m, D> {
    /// Explicit `class_names` take precedence over names the dataset carries.
    pub fn new(
        models: Models<'m>,
        data: &'m D,
        class_names: Option<Vec<String>>,
    ) -> Result<Self> {
        let models = models.into_registry()?;
        log::debug!(
            "Comparing {} models on {} samples",
            models.len(),
            data.labels().len()
        );

        Ok(Self {
            models,
            class_names: class_names.or_else(|| data.class_names()),
            data,
            predictions: None,
            comparison: None,
        })
    }

    /// Builds a comparer from already computed model outputs; no inference
    /// is run.
    pub fn from_predictions(
        predictions: Vec<Tensor>,
        data: &'m D,
        names: Option<Vec<String>>,
        class_names: Option<Vec<String>>,
    ) -> Result<Self> {
        let names = resolve_names(names, predictions.len())?;
        ensure_unique(names.iter().map(String::as_str))?;

        let expected = data.labels().len();
        let normalized = names
            .iter()
            .zip(&predictions)
            .map(|(name, raw)| ModelPredictions::from_raw(name, raw, expected))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            models: names.into_iter().map(|name| (name, None)).collect(),
            class_names: class_names.or_else(|| data.class_names()),
            data,
            predictions: Some(normalized),
            comparison: None,
        })
    }

    /// Runs every model over the dataset. Stops at the first failure; the
    /// results held before the call are left untouched and nothing from the
    /// failed run is kept.
    pub fn calculate_predictions(&mut self) -> Result<()> {
        let expected = self.data.labels().len();
        let mut predictions = Vec::with_capacity(self.models.len());
        for (name, model) in &self.models {
            let model = model.ok_or_else(|| EvaluationError::MissingModel(name.clone()))?;

            log::info!("Predicting with {}", name);
            let raw = self.data.predict(model)?;
            predictions.push(ModelPredictions::from_raw(name, &raw, expected)?);
        }

        self.predictions = Some(predictions);
        self.comparison = None;
        Ok(())
    }

    pub fn calculate_metric_comparison(&mut self) -> Result<&MetricComparison> {
        let predictions = self
            .predictions
            .as_ref()
            .ok_or(EvaluationError::PredictionsNotCalculated)?;

        let true_labels = self.data.labels();
        let reports = self
            .models
            .iter()
            .zip(predictions)
            .map(|((name, _), prediction)| {
                ClassificationReport::new(
                    true_labels,
                    &prediction.labels,
                    self.class_names.as_deref(),
                )
                .map(|report| (name.clone(), report))
            })
            .collect::<Result<Vec<_>>>()?;

        let table = ComparisonTable::from_reports(&reports);
        let summary = table.summary();

        Ok(self.comparison.insert(MetricComparison { table, summary }))
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(name, _)| name.as_str())
    }

    pub fn true_labels(&self) -> &[u32] {
        self.data.labels()
    }

    pub fn class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref()
    }

    pub fn predictions(&self, model: &str) -> Option<&ModelPredictions> {
        let index = self.models.iter().position(|(name, _)| name == model)?;
        self.predictions.as_ref().map(|all| &all[index])
    }

    pub fn comparison(&self) -> Option<&MetricComparison> {
        self.comparison.as_ref()
    }
}

fn resolve_names(names: Option<Vec<String>>, count: usize) -> Result<Vec<String>> {
    match names {
        Some(names) if names.len() != count => Err(EvaluationError::NameCountMismatch {
            names: names.len(),
            models: count,
        }),
        Some(names) => Ok(names),
        None => Ok((1..=count).map(|i| format!("model_{}", i)).collect()),
    }
}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();
    let mut duplicates: Vec<String> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            if !duplicates.iter().any(|d| d == name) {
                duplicates.push(name.to_string());
            }
        } else {
            seen.push(name);
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(EvaluationError::ModelNamesNotUnique { duplicates })
    }
}
