use candle_core::{DType, Module, Result as CandleResult, Tensor};
use std::collections::BTreeMap;

/// Ground truth plus a way of running a model over the matching features.
pub trait LabeledData {
    fn labels(&self) -> &[u32];

    /// Display names of the classes, ordered by class index.
    fn class_names(&self) -> Option<Vec<String>> {
        None
    }

    fn predict(&self, model: &dyn Module) -> CandleResult<Tensor>;
}

/// Features split into batches, with labels and a class name → index map.
#[derive(Debug, Clone)]
pub struct BatchedDataset {
    batches: Vec<Tensor>,
    labels: Vec<u32>,
    class_indices: BTreeMap<String, u32>,
}

impl BatchedDataset {
    pub fn new(batches: Vec<Tensor>, labels: Vec<u32>) -> Self {
        Self {
            batches,
            labels,
            class_indices: BTreeMap::new(),
        }
    }

    pub fn with_class_indices(mut self, class_indices: BTreeMap<String, u32>) -> Self {
        self.class_indices = class_indices;
        self
    }

    /// Splits `features` along dim 0 into batches of at most `batch_size`.
    pub fn from_features(
        features: &Tensor,
        labels: Vec<u32>,
        batch_size: usize,
    ) -> CandleResult<Self> {
        let num_samples = features.dim(0)?;
        let batch_size = batch_size.max(1);

        let mut batches = Vec::with_capacity(num_samples.div_ceil(batch_size));
        let mut start = 0;
        while start < num_samples {
            let len = batch_size.min(num_samples - start);
            batches.push(features.narrow(0, start, len)?);
            start += len;
        }

        Ok(Self::new(batches, labels))
    }

    pub fn batches(&self) -> &[Tensor] {
        &self.batches
    }

    pub fn class_indices(&self) -> &BTreeMap<String, u32> {
        &self.class_indices
    }
}

impl LabeledData for BatchedDataset {
    fn labels(&self) -> &[u32] {
        &self.labels
    }

    fn class_names(&self) -> Option<Vec<String>> {
        if self.class_indices.is_empty() {
            return None;
        }

        let mut by_index: Vec<_> = self.class_indices.iter().collect();
        by_index.sort_by_key(|(_, index)| **index);
        Some(by_index.into_iter().map(|(name, _)| name.clone()).collect())
    }

    fn predict(&self, model: &dyn Module) -> CandleResult<Tensor> {
        let outputs = self
            .batches
            .iter()
            .map(|batch| model.forward(batch))
            .collect::<CandleResult<Vec<_>>>()?;

        log::debug!("Predicted {} batches", outputs.len());
        Tensor::cat(&outputs, 0)
    }
}

/// A plain `(features, labels)` pair.
#[derive(Debug, Clone)]
pub struct FeatureLabelPair {
    features: Tensor,
    labels: Vec<u32>,
}

impl FeatureLabelPair {
    pub fn new(features: Tensor, labels: Vec<u32>) -> Self {
        Self { features, labels }
    }

    /// Accepts labels of any numeric dtype and shape; they are flattened.
    pub fn from_tensors(features: Tensor, labels: &Tensor) -> CandleResult<Self> {
        let labels = labels
            .flatten_all()?
            .to_dtype(DType::F64)?
            .to_vec1::<f64>()?
            .into_iter()
            .map(|label| label.round() as u32)
            .collect();

        Ok(Self::new(features, labels))
    }

    pub fn features(&self) -> &Tensor {
        &self.features
    }
}

impl LabeledData for FeatureLabelPair {
    fn labels(&self) -> &[u32] {
        &self.labels
    }

    fn predict(&self, model: &dyn Module) -> CandleResult<Tensor> {
        model.forward(&self.features)
    }
}
