mod comparison;
mod error;
mod feature_maps;
mod layers;
mod learning_curve;

pub use comparison::{plot_metric_comparison, render_metric_comparison};
pub use error::{Result, VisualizeError};
pub use feature_maps::{ChannelLayout, FeatureMapStrip, FeatureMaps};
pub use layers::{LayerOutputs, LayerStack};
pub use learning_curve::{LearningCurve, Panel, Series};
