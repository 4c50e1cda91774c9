mod args;
mod data;
mod model;
mod progress;
mod trainer;

use args::Args;
use candle_core::{DType, Device};
use candle_nn::{Module, VarBuilder, VarMap};
use clap::Parser;
use data::{Blobs, CLASS_NAMES};
use evaluation::{FeatureLabelPair, Models, PerformanceComparer};
use log::LevelFilter;
use simplelog::{Config, SimpleLogger, WriteLogger};
use std::error::Error;
use std::fs::{self, File};
use std::path::Path;
use trainer::Trainer;
use training::{CallbackList, EarlyStopping, History, LogDirectory};
use visualize::{plot_metric_comparison, ChannelLayout, FeatureMaps, LearningCurve};

const TASK: &str = "blobs";

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;
    fs::create_dir_all(&args.output)?;

    let device = Device::cuda_if_available(0)?;
    if device.is_cuda() {
        log::info!("Using CUDA");
    } else {
        log::info!("Using CPU");
    }

    let data = Blobs::generate(
        args.samples_per_class,
        args.noise,
        args.val_ratio,
        args.test_ratio,
        args.seed,
        &device,
    )?;

    log::info!("Training mlp");
    let mlp_vars = VarMap::new();
    let mlp = model::Mlp::new(&VarBuilder::from_varmap(&mlp_vars, DType::F32, &device))?;
    train("mlp", &mlp, &mlp_vars, &data, &args)?;

    log::info!("Training cnn");
    let cnn_vars = VarMap::new();
    let cnn = model::conv_net(&VarBuilder::from_varmap(&cnn_vars, DType::F32, &device))?;
    train("cnn", &cnn, &cnn_vars, &data, &args)?;

    compare(&mlp, &cnn, &data, &args.output)?;

    let sample = data.test.features.narrow(0, 0, data.test.len().min(1))?;
    let maps = FeatureMaps::compute(&cnn, &sample, ChannelLayout::First)?;
    maps.save_png(args.output.join("feature_maps"))?;

    log::info!("Done!");
    Ok(())
}

/// Fits one model with early stopping, a history recorder and scalar logging,
/// then saves its learning curve, history and weights.
fn train<M: Module>(
    name: &str,
    model: &M,
    varmap: &VarMap,
    data: &Blobs,
    args: &Args,
) -> Result<(), Box<dyn Error>> {
    let log_dir = LogDirectory::new(name)
        .task(TASK)
        .parent(&args.log_root)
        .provision()?;
    log::info!("Logging {} scalars to {}", name, log_dir.path.display());

    let mut logger = log_dir.logger;
    let mut history = History::new();
    let mut early_stopping = EarlyStopping::new(&args.monitor, args.min_change, args.patience);

    let mut trainer = Trainer::new(args, varmap)?;
    {
        let mut callbacks = CallbackList::new()
            .with(&mut early_stopping)
            .with(&mut history)
            .with(&mut logger);
        trainer.fit(model, data, &mut callbacks)?;
    }

    if let Some(epoch) = early_stopping.stopped_epoch() {
        log::info!("{} stopped at epoch {}", name, epoch);
    }

    LearningCurve::new(&history, Some("accuracy"), true)
        .render_svg(args.output.join(format!("{}_learning_curve.svg", name)))?;

    let history_path = args.output.join(format!("{}_history.json", name));
    serde_json::to_writer_pretty(File::create(&history_path)?, history.history())?;

    varmap.save(args.output.join(format!("{}.safetensors", name)))?;
    Ok(())
}

fn compare(
    mlp: &dyn Module,
    cnn: &dyn Module,
    data: &Blobs,
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    let test = FeatureLabelPair::new(data.test.features.clone(), data.test.labels.clone());
    let class_names = CLASS_NAMES.iter().map(|name| name.to_string()).collect();

    let models = Models::Mapping(vec![("mlp".to_string(), mlp), ("cnn".to_string(), cnn)]);
    let mut comparer = PerformanceComparer::new(models, &test, Some(class_names))?;
    comparer.calculate_predictions()?;
    let comparison = comparer.calculate_metric_comparison()?;

    log::info!("Model comparison:\n{}", comparison.table);
    for row in &comparison.summary {
        log::info!("{:>10} {:<10} {:.4}", row.model, row.metric, row.value);
    }

    serde_json::to_writer_pretty(File::create(output.join("comparison.json"))?, comparison)?;
    plot_metric_comparison(&comparison.summary, output.join("comparison.svg"))?;
    Ok(())
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    if let Some(log_file) = &args.log_file {
        WriteLogger::init(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file)?,
        )?;
    } else {
        SimpleLogger::init(LevelFilter::Info, Config::default())?;
    }

    Ok(args)
}
