use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{EvaluationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScores {
    pub name: String,
    pub label: u32,
    #[serde(flatten)]
    pub scores: Scores,
}

/// Per-class precision/recall/F1/support with accuracy and averages.
///
/// Classes are the sorted union of true and predicted labels. Ratios with a
/// zero denominator are reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassScores>,
    pub accuracy: f64,
    pub macro_avg: Scores,
    pub weighted_avg: Scores,
}

impl ClassificationReport {
    /// `target_names`, when given, names the classes in sorted label order
    /// and must have one entry per class.
    pub fn new(y_true: &[u32], y_pred: &[u32], target_names: Option<&[String]>) -> Result<Self> {
        let labels: Vec<u32> = y_true
            .iter()
            .chain(y_pred)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if let Some(names) = target_names {
            if names.len() != labels.len() {
                return Err(EvaluationError::ClassNamesMismatch {
                    names: names.len(),
                    classes: labels.len(),
                });
            }
        }

        let classes: Vec<ClassScores> = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| ClassScores {
                name: target_names
                    .map(|names| names[i].clone())
                    .unwrap_or_else(|| label.to_string()),
                label,
                scores: class_scores(y_true, y_pred, label),
            })
            .collect();

        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        let accuracy = ratio(correct, y_true.len());

        Ok(Self {
            macro_avg: average(&classes, |_| 1.0),
            weighted_avg: average(&classes, |scores| scores.support as f64),
            classes,
            accuracy,
        })
    }

    pub fn class(&self, name: &str) -> Option<&ClassScores> {
        self.classes.iter().find(|class| class.name == name)
    }
}

fn class_scores(y_true: &[u32], y_pred: &[u32], label: u32) -> Scores {
    let mut true_positive = 0;
    let mut false_positive = 0;
    let mut false_negative = 0;

    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == label, p == label) {
            (true, true) => true_positive += 1,
            (false, true) => false_positive += 1,
            (true, false) => false_negative += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(true_positive, true_positive + false_positive);
    let recall = ratio(true_positive, true_positive + false_negative);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Scores {
        precision,
        recall,
        f1_score,
        support: y_true.iter().filter(|&&t| t == label).count(),
    }
}

fn average(classes: &[ClassScores], weight: impl Fn(&Scores) -> f64) -> Scores {
    let support = classes.iter().map(|c| c.scores.support).sum();
    let total_weight: f64 = classes.iter().map(|c| weight(&c.scores)).sum();
    if total_weight == 0.0 {
        return Scores {
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            support,
        };
    }

    let weighted = |field: fn(&Scores) -> f64| {
        classes
            .iter()
            .map(|c| field(&c.scores) * weight(&c.scores))
            .sum::<f64>()
            / total_weight
    };

    Scores {
        precision: weighted(|s: &Scores| s.precision),
        recall: weighted(|s: &Scores| s.recall),
        f1_score: weighted(|s: &Scores| s.f1_score),
        support,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
