//! Reduces raw model output to a `(samples, 1)` score column or a
//! `(samples, classes)` probability matrix, and derives hard labels from it.
//!
//! Two-column output is always read as binary, with the positive class in
//! column 1.

use candle_core::{DType, Tensor};

use crate::error::{EvaluationError, Result};

/// Drops every size-1 dimension and returns a 2-D `f32` tensor.
///
/// A single sample with several classes (`(1, C)`) squeezes to `(C, 1)`,
/// the same as a column of `C` scores.
pub fn normalize(pred: &Tensor) -> Result<Tensor> {
    let pred = pred.to_dtype(DType::F32)?;
    let dims: Vec<usize> = pred.dims().iter().copied().filter(|&d| d != 1).collect();

    let normalized = match dims.as_slice() {
        [] => pred.reshape((1, 1))?,
        [n] => pred.reshape((*n, 1))?,
        [n, c] => pred.reshape((*n, *c))?,
        _ => return Err(EvaluationError::UnsupportedShape(pred.dims().to_vec())),
    };

    Ok(normalized)
}

/// Keeps the positive-class column of binary output and leaves score
/// columns and multi-class matrices untouched.
pub fn to_probability_column(pred: &Tensor) -> Result<Tensor> {
    let pred = match pred.rank() {
        0 => return Err(EvaluationError::UnsupportedShape(Vec::new())),
        1 => pred.unsqueeze(1)?,
        _ => pred.clone(),
    };

    let last = pred.rank() - 1;
    match pred.dims()[last] {
        2 => Ok(pred.narrow(last, 1, 1)?),
        _ => Ok(pred),
    }
}

/// Rounds a score column to `0`/`1`, or takes the arg-max class per row.
pub fn to_hard_label(prob: &Tensor) -> Result<Vec<u32>> {
    if is_single_column(prob) {
        let scores = prob.flatten_all()?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
        // `as` saturates negative scores to 0.
        return Ok(scores.into_iter().map(|s| s.round() as u32).collect());
    }

    Ok(prob.argmax(prob.rank() - 1)?.to_vec1::<u32>()?)
}

/// Confidence behind each hard label: the score itself for a single
/// column, the largest class probability otherwise.
pub fn label_scores(prob: &Tensor) -> Result<Vec<f32>> {
    let prob = prob.to_dtype(DType::F32)?;
    if is_single_column(&prob) {
        return Ok(prob.flatten_all()?.to_vec1::<f32>()?);
    }

    Ok(prob.max(prob.rank() - 1)?.to_vec1::<f32>()?)
}

fn is_single_column(prob: &Tensor) -> bool {
    prob.rank() < 2 || prob.dims().last() == Some(&1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_normalize_squeezes_to_two_dims() -> Result<()> {
        let pred = Tensor::new(&[[[0.2f32]], [[0.8]], [[0.4]]], &Device::Cpu)?;
        assert_eq!(normalize(&pred)?.dims(), &[3, 1]);

        let pred = Tensor::new(&[0.2f64, 0.8], &Device::Cpu)?;
        let normalized = normalize(&pred)?;
        assert_eq!(normalized.dims(), &[2, 1]);
        assert_eq!(normalized.dtype(), DType::F32);

        let pred = Tensor::new(&[[[0.1f32, 0.9]], [[0.6, 0.4]]], &Device::Cpu)?;
        assert_eq!(normalize(&pred)?.dims(), &[2, 2]);
        Ok(())
    }

    #[test]
    fn test_normalize_scalar_and_high_rank() -> Result<()> {
        let pred = Tensor::new(&[[0.5f32]], &Device::Cpu)?;
        assert_eq!(normalize(&pred)?.dims(), &[1, 1]);

        let pred = Tensor::zeros((2, 3, 4), DType::F32, &Device::Cpu)?;
        assert!(matches!(
            normalize(&pred),
            Err(EvaluationError::UnsupportedShape(dims)) if dims == vec![2, 3, 4]
        ));
        Ok(())
    }

    #[test]
    fn test_probability_column_binary_takes_positive_class() -> Result<()> {
        let pred = Tensor::new(&[[0.3f32, 0.7], [0.9, 0.1]], &Device::Cpu)?;
        let column = to_probability_column(&pred)?;
        assert_eq!(column.to_vec2::<f32>()?, vec![vec![0.7], vec![0.1]]);
        Ok(())
    }

    #[test]
    fn test_probability_column_passthrough() -> Result<()> {
        let single = Tensor::new(&[[0.3f32], [0.9]], &Device::Cpu)?;
        assert_eq!(to_probability_column(&single)?.dims(), &[2, 1]);

        let flat = Tensor::new(&[0.3f32, 0.9, 0.5], &Device::Cpu)?;
        assert_eq!(to_probability_column(&flat)?.dims(), &[3, 1]);

        let multi = Tensor::new(&[[0.1f32, 0.7, 0.2]], &Device::Cpu)?;
        assert_eq!(to_probability_column(&multi)?.dims(), &[1, 3]);
        Ok(())
    }

    #[test]
    fn test_hard_label_rounds_single_column() -> Result<()> {
        let prob = Tensor::new(&[[0.8f32], [0.2]], &Device::Cpu)?;
        assert_eq!(to_hard_label(&prob)?, vec![1, 0]);

        let prob = Tensor::new(&[[-0.4f32], [2.2]], &Device::Cpu)?;
        assert_eq!(to_hard_label(&prob)?, vec![0, 2]);
        Ok(())
    }

    #[test]
    fn test_hard_label_argmax_for_multiclass() -> Result<()> {
        let prob = Tensor::new(&[[0.1f32, 0.7, 0.2]], &Device::Cpu)?;
        assert_eq!(to_hard_label(&prob)?, vec![1]);

        let prob = Tensor::new(&[[0.5f32, 0.2, 0.3], [0.0, 0.1, 0.9]], &Device::Cpu)?;
        assert_eq!(to_hard_label(&prob)?, vec![0, 2]);
        Ok(())
    }

    #[test]
    fn test_label_scores() -> Result<()> {
        let prob = Tensor::new(&[[0.5f32, 0.2, 0.3], [0.0, 0.1, 0.9]], &Device::Cpu)?;
        assert_eq!(label_scores(&prob)?, vec![0.5, 0.9]);

        let prob = Tensor::new(&[[0.25f32], [0.75]], &Device::Cpu)?;
        assert_eq!(label_scores(&prob)?, vec![0.25, 0.75]);
        Ok(())
    }

    #[test]
    fn test_pipeline_from_two_column_softmax() -> Result<()> {
        let raw = Tensor::new(&[[[0.3f32, 0.7]], [[0.9, 0.1]], [[0.45, 0.55]]], &Device::Cpu)?;
        let prob = to_probability_column(&normalize(&raw)?)?;
        assert_eq!(to_hard_label(&prob)?, vec![1, 0, 1]);
        Ok(())
    }
}
