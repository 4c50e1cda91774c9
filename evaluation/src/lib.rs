mod comparer;
mod dataset;
mod error;
pub mod normalize;
mod report;
mod table;


pub use comparer::{MetricComparison, ModelPredictions, Models, PerformanceComparer};
pub use dataset::{BatchedDataset, FeatureLabelPair, LabeledData};
pub use error::{EvaluationError, Result, MODEL_NAMES_NOT_UNIQUE};
pub use report::{ClassScores, ClassificationReport, Scores};
pub use table::{
    ComparisonRow, ComparisonTable, Metric, MetricValue, ACCURACY_COLUMN, MACRO_AVG_COLUMN,
    WEIGHTED_AVG_COLUMN,
};
