use thiserror::Error;

pub type Result<T> = std::result::Result<T, CallbackError>;

#[derive(Error, Debug)]
pub enum CallbackError {
    /// The epoch snapshot did not carry the metric a callback monitors.
    #[error("metric '{0}' is missing from the epoch logs")]
    MissingMetric(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
