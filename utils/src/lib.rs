mod history;

pub use history::{AsHistory, EpochLogs, MetricHistory};
