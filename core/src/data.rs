use candle_core::{Device, Result, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Samples are `SIDE` x `SIDE` single-channel images, flattened.
pub const SIDE: usize = 4;
pub const NUM_FEATURES: usize = SIDE * SIDE;
pub const CLASS_NAMES: [&str; 3] = ["rows", "columns", "diagonals"];
pub const NUM_CLASSES: usize = CLASS_NAMES.len();

fn pattern(class: usize, row: usize, col: usize) -> f32 {
    let lit = match class {
        0 => row % 2 == 0,
        1 => col % 2 == 0,
        _ => row == col || row + col == SIDE - 1,
    };
    if lit {
        1.0
    } else {
        0.0
    }
}

pub struct Split {
    pub features: Tensor,
    pub labels: Vec<u32>,
}

impl Split {
    fn gather(samples: &[(Vec<f32>, u32)], device: &Device) -> Result<Self> {
        let labels = samples.iter().map(|(_, label)| *label).collect();
        let flat: Vec<f32> = samples
            .iter()
            .flat_map(|(features, _)| features.iter().copied())
            .collect();
        let features = Tensor::from_vec(flat, (samples.len(), NUM_FEATURES), device)?;

        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_tensor(&self) -> Result<Tensor> {
        Tensor::new(self.labels.as_slice(), self.features.device())
    }
}

/// Noisy line patterns, one pattern per class, split three ways.
pub struct Blobs {
    pub train: Split,
    pub val: Split,
    pub test: Split,
}

impl Blobs {
    pub fn generate(
        samples_per_class: usize,
        noise: f32,
        val_ratio: f64,
        test_ratio: f64,
        seed: u64,
        device: &Device,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = noise.abs();

        let mut samples = Vec::with_capacity(samples_per_class * NUM_CLASSES);
        for class in 0..NUM_CLASSES {
            for _ in 0..samples_per_class {
                let features = (0..NUM_FEATURES)
                    .map(|i| pattern(class, i / SIDE, i % SIDE) + rng.gen_range(-noise..=noise))
                    .collect();
                samples.push((features, class as u32));
            }
        }
        samples.shuffle(&mut rng);

        let test_len = (samples.len() as f64 * test_ratio.clamp(0.0, 0.5)) as usize;
        let val_len = (samples.len() as f64 * val_ratio.clamp(0.0, 0.5)) as usize;
        let (test, rest) = samples.split_at(test_len);
        let (val, train) = rest.split_at(val_len);

        log::info!(
            "Generated {} samples: {} train, {} val, {} test",
            samples.len(),
            train.len(),
            val.len(),
            test.len()
        );

        Ok(Self {
            train: Split::gather(train, device)?,
            val: Split::gather(val, device)?,
            test: Split::gather(test, device)?,
        })
    }
}
