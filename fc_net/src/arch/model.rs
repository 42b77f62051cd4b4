use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::{
    Mode, Precision, Result,
    params::{Gradients, ParamStore},
};

/// What a `Model::loss` call produces.
#[derive(Debug, Clone)]
pub enum Evaluation<F> {
    /// No labels were given: the class scores of shape `(N, C)`.
    Scores(Array2<F>),
    /// Labels were given: the regularized loss and the gradient of every parameter.
    Loss { loss: F, grads: Gradients<F> },
}

/// A classifier exposing class scores, and given labels, loss and gradients.
///
/// A model never updates its own parameters: whoever trains it reads the gradients and writes
/// the new values through `params_mut` between calls.
pub trait Model<F: Precision> {
    /// The model's parameters.
    fn params(&self) -> &ParamStore<F>;

    /// The model's parameters, for a training loop to update.
    fn params_mut(&mut self) -> &mut ParamStore<F>;

    /// The mode the last call ran in.
    fn mode(&self) -> Mode;

    /// The amount of classes scores are computed for.
    fn num_classes(&self) -> usize;

    /// Runs a test mode forward pass.
    ///
    /// # Arguments
    /// * `x` - The input batch of shape `(N, D)`.
    ///
    /// # Returns
    /// The class scores of shape `(N, C)`.
    fn scores(&mut self, x: ArrayView2<F>) -> Result<Array2<F>>;

    /// Runs a train mode forward and backward pass.
    ///
    /// # Arguments
    /// * `x` - The input batch of shape `(N, D)`.
    /// * `y` - The label of each sample, in `[0, C)`.
    ///
    /// # Returns
    /// The data loss plus the L2 penalty, and the gradient of every parameter.
    fn loss_and_grads(&mut self, x: ArrayView2<F>, y: ArrayView1<usize>) -> Result<(F, Gradients<F>)>;

    /// Evaluates the model, in train mode if labels are given and in test mode otherwise.
    fn loss(&mut self, x: ArrayView2<F>, y: Option<ArrayView1<usize>>) -> Result<Evaluation<F>> {
        match y {
            Some(y) => {
                let (loss, grads) = self.loss_and_grads(x, y)?;
                Ok(Evaluation::Loss { loss, grads })
            }
            None => Ok(Evaluation::Scores(self.scores(x)?)),
        }
    }
}
