mod callback;
mod early_stopping;
mod error;
mod history;
mod log_dir;
mod scalar_logger;

pub use callback::{Callback, CallbackList, TrainingSignal};
pub use early_stopping::{EarlyStopping, EarlyStoppingConfig};
pub use error::{CallbackError, Result};
pub use history::History;
pub use log_dir::{LogDirectory, ProvisionedLogDir, TIMESTAMP_FORMAT};
pub use scalar_logger::ScalarLogger;
pub use utils::{AsHistory, EpochLogs, MetricHistory};
