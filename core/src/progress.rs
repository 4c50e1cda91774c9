use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;

pub struct TrainingProgressBar {
    bar: ProgressBar,
}

impl TrainingProgressBar {
    pub fn new(epoch: usize, num_batches: usize) -> Result<Self, Box<dyn Error>> {
        let bar = ProgressBar::new(num_batches as u64);
        bar.set_style(ProgressStyle::default_bar().template(
            "{prefix} {spinner:.cyan} {pos}/{len} [{wide_bar:.cyan/blue}] {eta_precise} | {msg}",
        )?);
        bar.set_prefix(format!("epoch {:>3}", epoch));
        Ok(Self { bar })
    }

    pub fn update(&self, loss: f32) {
        self.bar.set_message(format!("loss: {:.5}", loss));
        self.bar.inc(1);
    }

    pub fn finish(&self, train_loss: f32, val_loss: f32, val_accuracy: f32) {
        self.bar.set_message(format!(
            "val: {:.5}, loss: {:.5}, val acc: {:.3}",
            val_loss, train_loss, val_accuracy
        ));

        self.bar.finish();
    }
}
