use thiserror::Error;

pub type Result<T> = std::result::Result<T, VisualizeError>;

#[derive(Error, Debug)]
pub enum VisualizeError {
    #[error("plotting error: {0}")]
    Plot(String),

    #[error("nothing to plot")]
    Empty,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Plotters errors are generic over the backend; keep only the message.
pub(crate) fn plot_error(err: impl std::fmt::Display) -> VisualizeError {
    VisualizeError::Plot(err.to_string())
}
