use candle_core::{DType, Tensor};
use image::{GrayImage, Luma};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::layers::LayerOutputs;

/// Position of the channel axis in 4-D activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
    /// `(batch, height, width, channels)`
    #[default]
    Last,
    /// `(batch, channels, height, width)`, as produced by candle convolutions.
    First,
}

/// One layer's channels laid side by side: `height` x `width * channels`.
#[derive(Debug, Clone)]
pub struct FeatureMapStrip {
    pub layer: String,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub image: GrayImage,
}

impl FeatureMapStrip {
    fn from_activation(layer: String, sample: &Tensor, layout: ChannelLayout) -> Result<Self> {
        let sample = match layout {
            ChannelLayout::Last => sample.permute((2, 0, 1))?,
            ChannelLayout::First => sample.clone(),
        };
        let sample = sample.to_dtype(DType::F32)?.contiguous()?;
        let (channels, height, width) = sample.dims3()?;

        let tiles = sample
            .to_vec3::<f32>()?
            .into_iter()
            .map(|channel| display_pixels(channel.into_iter().flatten().collect()))
            .collect::<Vec<_>>();

        let image = GrayImage::from_fn((width * channels) as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Luma([tiles[x / width][y * width + x % width]])
        });

        Ok(Self {
            layer,
            height,
            width,
            channels,
            image,
        })
    }

    /// Value shown for `channel` at (`row`, `col`).
    pub fn pixel(&self, channel: usize, row: usize, col: usize) -> u8 {
        let x = (channel * self.width + col) as u32;
        self.image.get_pixel(x, row as u32)[0]
    }
}

/// Standardizes one channel and maps it onto the 8-bit display range.
fn display_pixels(values: Vec<f32>) -> Vec<u8> {
    let n = values.len().max(1) as f32;
    let mean = values.iter().sum::<f32>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt();
    let std = if std.is_finite() && std > 0.0 { std } else { 1.0 };

    values
        .into_iter()
        .map(|v| ((v - mean) / std * 64.0 + 128.0).clamp(0.0, 255.0) as u8)
        .collect()
}

/// Activations of every convolutional (4-D) layer for a single input.
#[derive(Debug, Clone, Default)]
pub struct FeatureMaps {
    strips: Vec<FeatureMapStrip>,
}

impl FeatureMaps {
    /// Runs one forward pass and keeps the first sample of each 4-D
    /// activation. Layers with any other rank are skipped.
    pub fn compute<M: LayerOutputs + ?Sized>(
        model: &M,
        input: &Tensor,
        layout: ChannelLayout,
    ) -> Result<Self> {
        let mut strips = Vec::new();
        for (layer, activation) in model.layer_outputs(input)? {
            if activation.rank() != 4 {
                log::debug!("Skipping {} with shape {:?}", layer, activation.dims());
                continue;
            }

            let sample = activation.get(0)?;
            strips.push(FeatureMapStrip::from_activation(layer, &sample, layout)?);
        }

        Ok(Self { strips })
    }

    pub fn strips(&self) -> &[FeatureMapStrip] {
        &self.strips
    }

    /// Writes `<layer>.png` per strip into `dir`, creating it if needed.
    pub fn save_png(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut paths = Vec::with_capacity(self.strips.len());
        for strip in &self.strips {
            let file_name = format!("{}.png", strip.layer.replace(['/', '\\'], "_"));
            let path = dir.join(file_name);
            strip.image.save(&path)?;
            log::info!("Saved feature maps of {} to {}", strip.layer, path.display());
            paths.push(path);
        }
        Ok(paths)
    }
}
