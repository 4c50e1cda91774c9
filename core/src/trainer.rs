use candle_core::{DType, Result as CandleResult, Tensor, D};
use candle_nn::{loss, AdamW, Module, Optimizer, ParamsAdamW, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::error::Error;
use training::{Callback, EpochLogs};

use crate::args::Args;
use crate::data::{Blobs, Split};
use crate::progress::TrainingProgressBar;

/// Mean batch loss and accuracy of `model` on `split`.
pub fn evaluate<M: Module + ?Sized>(
    model: &M,
    split: &Split,
    batch_size: usize,
) -> CandleResult<(f32, f32)> {
    if split.is_empty() {
        return Ok((0.0, 0.0));
    }

    let labels = split.label_tensor()?;
    let mut total_loss = 0f32;
    let mut correct = 0f32;
    let mut batch_count = 0usize;

    for start in (0..split.len()).step_by(batch_size) {
        let len = batch_size.min(split.len() - start);
        let x = split.features.narrow(0, start, len)?;
        let y = labels.narrow(0, start, len)?;

        let logits = model.forward(&x)?;
        total_loss += loss::cross_entropy(&logits, &y)?.to_vec0::<f32>()?;
        correct += correct_count(&logits, &y)?;
        batch_count += 1;
    }

    Ok((
        total_loss / batch_count.max(1) as f32,
        correct / split.len() as f32,
    ))
}

fn correct_count(logits: &Tensor, labels: &Tensor) -> CandleResult<f32> {
    logits
        .argmax(D::Minus1)?
        .eq(labels)?
        .to_dtype(DType::F32)?
        .sum_all()?
        .to_vec0::<f32>()
}

pub struct Trainer {
    optimizer: AdamW,
    rng: StdRng,
    batch_size: usize,
    epochs: usize,
    lr_decay: f64,
}

impl Trainer {
    pub fn new(args: &Args, varmap: &VarMap) -> CandleResult<Self> {
        let optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: args.learning_rate,
                ..Default::default()
            },
        )?;

        Ok(Self {
            optimizer,
            rng: StdRng::seed_from_u64(args.seed),
            batch_size: args.batch_size.max(1),
            epochs: args.epochs,
            lr_decay: args.lr_decay,
        })
    }

    /// Trains until the epoch budget runs out or a callback asks to stop.
    /// Returns the number of epochs run.
    pub fn fit<M: Module>(
        &mut self,
        model: &M,
        data: &Blobs,
        callbacks: &mut dyn Callback,
    ) -> Result<usize, Box<dyn Error>> {
        callbacks.on_train_begin()?;

        let mut order: Vec<u32> = (0..data.train.len() as u32).collect();
        let mut epochs_run = 0;

        for epoch in 0..self.epochs {
            order.shuffle(&mut self.rng);

            let logs = self.train_epoch(epoch, model, data, &order)?;
            epochs_run = epoch + 1;

            if callbacks.on_epoch_end(epoch, &logs)?.should_stop() {
                log::info!("Early stopping after {} epochs", epochs_run);
                break;
            }

            self.decay_learning_rate();
        }

        callbacks.on_train_end()?;
        Ok(epochs_run)
    }

    fn train_epoch<M: Module>(
        &mut self,
        epoch: usize,
        model: &M,
        data: &Blobs,
        order: &[u32],
    ) -> Result<EpochLogs, Box<dyn Error>> {
        let num_batches = order.len().div_ceil(self.batch_size);
        let progress = TrainingProgressBar::new(epoch, num_batches)?;

        let labels = data.train.label_tensor()?;
        let device = data.train.features.device();

        let mut total_loss = 0f32;
        let mut correct = 0f32;
        let mut batches_processed = 0;
        let mut train_loss = 0f32;

        for batch in order.chunks(self.batch_size) {
            let indices = Tensor::new(batch, device)?;
            let x = data.train.features.index_select(&indices, 0)?;
            let y = labels.index_select(&indices, 0)?;

            let logits = model.forward(&x)?;
            let loss = loss::cross_entropy(&logits, &y)?;
            self.optimizer.backward_step(&loss)?;

            total_loss += loss.to_vec0::<f32>()?;
            correct += correct_count(&logits, &y)?;
            batches_processed += 1;

            train_loss = total_loss / batches_processed as f32;
            progress.update(train_loss);
        }

        let accuracy = correct / order.len().max(1) as f32;
        let (val_loss, val_accuracy) = evaluate(model, &data.val, self.batch_size)?;

        progress.finish(train_loss, val_loss, val_accuracy);

        let mut logs = EpochLogs::new();
        logs.insert("loss".to_string(), train_loss as f64);
        logs.insert("accuracy".to_string(), accuracy as f64);
        logs.insert("val_loss".to_string(), val_loss as f64);
        logs.insert("val_accuracy".to_string(), val_accuracy as f64);
        logs.insert("lr".to_string(), self.optimizer.learning_rate());
        Ok(logs)
    }

    fn decay_learning_rate(&mut self) {
        if self.lr_decay < 1.0 {
            let new_lr = self.optimizer.learning_rate() * self.lr_decay;
            self.optimizer.set_learning_rate(new_lr);
        }
    }
}
