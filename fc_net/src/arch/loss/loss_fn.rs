use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::Result;

/// A classification loss computed on raw class scores.
pub trait LossFn<F> {
    /// Computes the mean loss over the batch and its gradient with respect to the scores.
    ///
    /// # Arguments
    /// * `scores` - The raw class scores of shape `(N, C)`.
    /// * `y` - The label of each sample, each in `[0, C)`.
    ///
    /// # Returns
    /// The loss and the gradient of shape `(N, C)`.
    fn loss(&self, scores: ArrayView2<F>, y: ArrayView1<usize>) -> Result<(F, Array2<F>)>;
}
