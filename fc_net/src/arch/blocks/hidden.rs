use log::trace;
use ndarray::{Array1, Array2, ArrayView2};

use super::{
    AffineNormReluCache, AffineNormReluDropoutCache, AffineReluCache, AffineReluDropoutCache,
    affine_norm_relu_backward, affine_norm_relu_dropout_backward, affine_norm_relu_dropout_forward,
    affine_norm_relu_forward, affine_relu_backward, affine_relu_dropout_backward,
    affine_relu_dropout_forward, affine_relu_forward,
};
use crate::{
    MlErr, Precision, Result,
    arch::layers::{BatchNormState, DropoutParam},
    params::{LayerParams, ScaleShift},
};

/// The pipeline every hidden layer of a network runs through.
///
/// Chosen once when the network is built, every hidden layer then uses the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenBlock {
    /// affine → relu
    Plain,
    /// affine → batchnorm → relu
    Norm,
    /// affine → relu → dropout
    Drop,
    /// affine → batchnorm → relu → dropout
    NormDrop,
}

/// The cache of one hidden layer, tagged with the pipeline that produced it.
#[derive(Debug, Clone)]
pub enum BlockCache<F> {
    Plain(AffineReluCache<F>),
    Norm(AffineNormReluCache<F>),
    Drop(AffineReluDropoutCache<F>),
    NormDrop(AffineNormReluDropoutCache<F>),
}

impl HiddenBlock {
    /// Picks the pipeline for the given normalization and dropout choices.
    pub fn resolve(use_batchnorm: bool, use_dropout: bool) -> Self {
        match (use_batchnorm, use_dropout) {
            (false, false) => HiddenBlock::Plain,
            (true, false) => HiddenBlock::Norm,
            (false, true) => HiddenBlock::Drop,
            (true, true) => HiddenBlock::NormDrop,
        }
    }

    pub fn uses_batchnorm(self) -> bool {
        matches!(self, HiddenBlock::Norm | HiddenBlock::NormDrop)
    }

    pub fn uses_dropout(self) -> bool {
        matches!(self, HiddenBlock::Drop | HiddenBlock::NormDrop)
    }

    /// Runs one hidden layer forward.
    ///
    /// # Arguments
    /// * `layer` - The one based index of the layer, only used for error reporting.
    /// * `x` - The layer's input.
    /// * `params` - The layer's own parameters.
    /// * `bn_state` - The layer's own normalization state, required by normalizing pipelines.
    /// * `dropout` - The network's dropout parameter, required by dropout pipelines.
    ///
    /// # Returns
    /// The layer's output and its cache.
    pub fn forward<F: Precision>(
        self,
        layer: usize,
        x: ArrayView2<F>,
        params: &LayerParams<F>,
        bn_state: Option<&mut BatchNormState<F>>,
        dropout: Option<&mut DropoutParam>,
    ) -> Result<(Array2<F>, BlockCache<F>)> {
        let LayerParams { w, b, norm } = params;
        trace!(layer = layer, rows = x.nrows(), cols = x.ncols(); "hidden layer forward");

        let missing = |what| MlErr::MissingLayerState { layer, what };
        let scale_shift = || norm.as_ref().ok_or_else(|| missing("scale and shift"));

        let (out, cache) = match self {
            HiddenBlock::Plain => {
                let (out, cache) = affine_relu_forward(x, w.view(), b.view())?;
                (out, BlockCache::Plain(cache))
            }
            HiddenBlock::Norm => {
                let ScaleShift { gamma, beta } = scale_shift()?;
                let bn_state = bn_state.ok_or_else(|| missing("running statistics"))?;
                let (out, cache) = affine_norm_relu_forward(
                    x,
                    w.view(),
                    b.view(),
                    gamma.view(),
                    beta.view(),
                    bn_state,
                )?;
                (out, BlockCache::Norm(cache))
            }
            HiddenBlock::Drop => {
                let dropout = dropout.ok_or_else(|| missing("a dropout parameter"))?;
                let (out, cache) = affine_relu_dropout_forward(x, w.view(), b.view(), dropout)?;
                (out, BlockCache::Drop(cache))
            }
            HiddenBlock::NormDrop => {
                let ScaleShift { gamma, beta } = scale_shift()?;
                let bn_state = bn_state.ok_or_else(|| missing("running statistics"))?;
                let dropout = dropout.ok_or_else(|| missing("a dropout parameter"))?;
                let (out, cache) = affine_norm_relu_dropout_forward(
                    x,
                    w.view(),
                    b.view(),
                    gamma.view(),
                    beta.view(),
                    bn_state,
                    dropout,
                )?;
                (out, BlockCache::NormDrop(cache))
            }
        };

        Ok((out, cache))
    }
}

impl<F: Precision> BlockCache<F> {
    /// Runs the backward pass of the pipeline that produced this cache.
    ///
    /// # Returns
    /// The gradient with respect to the layer's input and the layer's parameter gradients,
    /// with a scale and shift gradient only for normalizing pipelines.
    pub fn backward(self, dout: ArrayView2<F>) -> Result<(Array2<F>, LayerParams<F>)> {
        let plain = |(dx, w, b): (Array2<F>, Array2<F>, Array1<F>)| {
            (dx, LayerParams { w, b, norm: None })
        };
        #[allow(clippy::type_complexity)]
        let normed = |(dx, w, b, gamma, beta): (Array2<F>, Array2<F>, Array1<F>, Array1<F>, Array1<F>)| {
            let norm = Some(ScaleShift { gamma, beta });
            (dx, LayerParams { w, b, norm })
        };

        let grads = match self {
            BlockCache::Plain(cache) => plain(affine_relu_backward(dout, cache)?),
            BlockCache::Norm(cache) => normed(affine_norm_relu_backward(dout, cache)?),
            BlockCache::Drop(cache) => plain(affine_relu_dropout_backward(dout, cache)?),
            BlockCache::NormDrop(cache) => {
                normed(affine_norm_relu_dropout_backward(dout, cache)?)
            }
        };

        Ok(grads)
    }
}
