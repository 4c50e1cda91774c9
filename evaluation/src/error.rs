use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvaluationError>;

pub const MODEL_NAMES_NOT_UNIQUE: &str =
    "The model names are not unique! Please make model names unique or provide a dictionary of models";

#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Two models resolved to the same name. `duplicates` lists the offenders.
    #[error("{}", MODEL_NAMES_NOT_UNIQUE)]
    ModelNamesNotUnique { duplicates: Vec<String> },

    #[error("{names} model names given for {models} models")]
    NameCountMismatch { names: usize, models: usize },

    #[error("predictions of shape {0:?} cannot be reduced to (samples, classes)")]
    UnsupportedShape(Vec<usize>),

    #[error("model '{model}' produced {predictions} predictions for {labels} labels")]
    LengthMismatch {
        model: String,
        predictions: usize,
        labels: usize,
    },

    #[error("{names} class names given for {classes} classes")]
    ClassNamesMismatch { names: usize, classes: usize },

    #[error("model '{0}' has no handle to run inference with")]
    MissingModel(String),

    #[error("predictions have not been calculated")]
    PredictionsNotCalculated,

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}
