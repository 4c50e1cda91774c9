use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "fitkit")]
#[command(author = "Jørgen Hanssen <jorgen@hanssen.io>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Maximum number of training epochs.
    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    /// Number of samples per training batch.
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Initial learning rate for optimizer.
    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f64,

    /// Learning rate decay factor per epoch.
    #[arg(long, default_value_t = 0.97)]
    pub lr_decay: f64,

    /// Metric watched by early stopping.
    #[arg(long, default_value = "val_loss")]
    pub monitor: String,

    /// Epochs without improvement tolerated before early stopping.
    #[arg(long, default_value_t = 2)]
    pub patience: usize,

    /// Smallest decrease of the monitored metric that counts as improvement.
    #[arg(long, default_value_t = 0.0)]
    pub min_change: f64,

    /// Synthetic samples generated per class.
    #[arg(long, default_value_t = 200)]
    pub samples_per_class: usize,

    /// Amplitude of the noise added to each synthetic sample.
    #[arg(long, default_value_t = 0.6)]
    pub noise: f32,

    /// Fraction of data for validation set.
    #[arg(long, default_value_t = 0.2)]
    pub val_ratio: f64,

    /// Fraction of data for test set.
    #[arg(long, default_value_t = 0.2)]
    pub test_ratio: f64,

    /// Seed for data generation and shuffling.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Root directory for per-run scalar logs.
    #[arg(long, default_value = "logs")]
    pub log_root: PathBuf,

    /// Directory for plots, histories and the comparison table.
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Write debug logs to a file instead of the terminal.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,
}
