use candle_core::{Module, Result, Tensor};

/// A model that can report the activation of every layer for one input.
pub trait LayerOutputs {
    fn layer_outputs(&self, input: &Tensor) -> Result<Vec<(String, Tensor)>>;
}

/// Named layers applied in order.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<(String, Box<dyn Module>)>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, layer: impl Module + 'static) -> Self {
        self.layers.push((name.into(), Box::new(layer)));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Module for LayerStack {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();
        for (_, layer) in &self.layers {
            xs = layer.forward(&xs)?;
        }
        Ok(xs)
    }
}

impl LayerOutputs for LayerStack {
    fn layer_outputs(&self, input: &Tensor) -> Result<Vec<(String, Tensor)>> {
        let mut outputs = Vec::with_capacity(self.layers.len());
        let mut xs = input.clone();
        for (name, layer) in &self.layers {
            xs = layer.forward(&xs)?;
            outputs.push((name.clone(), xs.clone()));
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::Activation;

    #[test]
    fn test_outputs_match_forward() -> Result<()> {
        let stack = LayerStack::new()
            .add("double", |xs: &Tensor| xs * 2.0)
            .add("relu", Activation::Relu)
            .add("flatten", |xs: &Tensor| xs.flatten_from(1));

        let input = Tensor::new(&[[[-1f32, 2.0], [3.0, -4.0]]], &Device::Cpu)?;
        let outputs = stack.layer_outputs(&input)?;

        let names: Vec<_> = outputs.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["double", "relu", "flatten"]);
        assert_eq!(outputs[1].1.dims(), &[1, 2, 2]);
        assert_eq!(outputs[2].1.dims(), &[1, 4]);

        let last = stack.forward(&input)?;
        assert_eq!(last.to_vec2::<f32>()?, vec![vec![0.0, 4.0, 6.0, 0.0]]);
        assert_eq!(
            outputs[2].1.to_vec2::<f32>()?,
            last.to_vec2::<f32>()?
        );
        assert_eq!(last.dtype(), DType::F32);
        Ok(())
    }
}
