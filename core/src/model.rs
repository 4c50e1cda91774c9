use candle_core::{Result, Tensor};
use candle_nn::{conv2d, linear, Activation, Conv2dConfig, Linear, Module, VarBuilder};
use visualize::LayerStack;

use crate::data::{NUM_CLASSES, NUM_FEATURES, SIDE};

const HIDDEN_SIZE: usize = 32;
const CONV_CHANNELS: usize = 4;

pub struct Mlp {
    hidden: Linear,
    output: Linear,
}

impl Mlp {
    pub fn new(vs: &VarBuilder) -> Result<Self> {
        let network = Self {
            hidden: linear(NUM_FEATURES, HIDDEN_SIZE, vs.pp("hidden"))?,
            output: linear(HIDDEN_SIZE, NUM_CLASSES, vs.pp("output"))?,
        };

        Ok(network)
    }
}

impl Module for Mlp {
    #[inline]
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        x.apply(&self.hidden)?.relu()?.apply(&self.output)
    }
}

/// Small convolutional classifier. Every step is a named layer so its
/// activations can be inspected.
pub fn conv_net(vs: &VarBuilder) -> Result<LayerStack> {
    let conv = conv2d(
        1,
        CONV_CHANNELS,
        3,
        Conv2dConfig {
            padding: 1,
            ..Default::default()
        },
        vs.pp("conv"),
    )?;
    let head = linear(CONV_CHANNELS * SIDE * SIDE, NUM_CLASSES, vs.pp("head"))?;

    Ok(LayerStack::new()
        .add("image", |x: &Tensor| -> Result<Tensor> {
            x.reshape((x.dim(0)?, 1, SIDE, SIDE))
        })
        .add("conv", conv)
        .add("relu", Activation::Relu)
        .add("flatten", |x: &Tensor| -> Result<Tensor> { x.flatten_from(1) })
        .add("head", head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;
    use visualize::LayerOutputs;

    #[test]
    fn test_models_output_one_logit_per_class() -> Result<()> {
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let input = Tensor::zeros((5, NUM_FEATURES), DType::F32, &Device::Cpu)?;

        let mlp = Mlp::new(&vs.pp("mlp"))?;
        assert_eq!(mlp.forward(&input)?.dims(), &[5, NUM_CLASSES]);

        let conv = conv_net(&vs.pp("cnn"))?;
        assert_eq!(conv.forward(&input)?.dims(), &[5, NUM_CLASSES]);
        Ok(())
    }

    #[test]
    fn test_conv_layers_are_channels_first() -> Result<()> {
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let conv = conv_net(&vs)?;

        let input = Tensor::zeros((2, NUM_FEATURES), DType::F32, &Device::Cpu)?;
        let outputs = conv.layer_outputs(&input)?;
        let (name, activation) = &outputs[1];
        assert_eq!(name, "conv");
        assert_eq!(activation.dims(), &[2, CONV_CHANNELS, SIDE, SIDE]);
        Ok(())
    }
}
