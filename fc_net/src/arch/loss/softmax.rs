use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::LossFn;
use crate::{MlErr, Precision, Result, arch::layers::ensure_size};

/// Softmax cross entropy loss.
#[derive(Debug, Default, Clone, Copy)]
pub struct Softmax;

impl<F: Precision> LossFn<F> for Softmax {
    fn loss(&self, scores: ArrayView2<F>, y: ArrayView1<usize>) -> Result<(F, Array2<F>)> {
        softmax_loss(scores, y)
    }
}

/// Computes the softmax cross entropy of `scores` against the labels `y`, averaged over the
/// batch, together with its gradient with respect to `scores`.
///
/// Scores are shifted by their row maximum before exponentiating, so large raw scores do not
/// overflow.
pub fn softmax_loss<F: Precision>(
    scores: ArrayView2<F>,
    y: ArrayView1<usize>,
) -> Result<(F, Array2<F>)> {
    let (n, c) = scores.dim();
    ensure_labels(y, n, c)?;

    let mut probs = scores.to_owned();
    let mut loss = F::zero();

    for (mut row, &label) in probs.axis_iter_mut(Axis(0)).zip(y.iter()) {
        let max = row.fold(F::neg_infinity(), |m, &v| m.max(v));
        row.mapv_inplace(|v| v - max);

        let log_sum = row.mapv(|v| v.exp()).sum().ln();
        loss -= row[label] - log_sum;

        row.mapv_inplace(|v| (v - log_sum).exp());
    }

    let n = F::cast(n as f64);
    for (mut row, &label) in probs.axis_iter_mut(Axis(0)).zip(y.iter()) {
        row[label] -= F::one();
    }
    probs /= n;

    Ok((loss / n, probs))
}

/// Fails unless `y` holds one label in `[0, num_classes)` for each of the `n > 0` samples.
pub fn ensure_labels(y: ArrayView1<usize>, n: usize, num_classes: usize) -> Result<()> {
    ensure_size("labels", "batch rows", y.len(), n)?;
    if n == 0 {
        return Err(MlErr::EmptyBatch);
    }
    if let Some(&label) = y.iter().find(|&&label| label >= num_classes) {
        return Err(MlErr::LabelOutOfRange { label, num_classes });
    }

    Ok(())
}
