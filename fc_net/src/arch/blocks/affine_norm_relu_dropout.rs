use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::{AffineNormReluCache, affine_norm_relu_backward, affine_norm_relu_forward};
use crate::{
    Precision, Result,
    arch::layers::{BatchNormState, DropoutCache, DropoutParam, dropout_backward, dropout_forward},
};

#[derive(Debug, Clone)]
pub struct AffineNormReluDropoutCache<F> {
    fc_bn_relu: AffineNormReluCache<F>,
    dropout: DropoutCache<F>,
}

/// affine-batchnorm-relu → dropout.
#[allow(clippy::too_many_arguments)]
pub fn affine_norm_relu_dropout_forward<F: Precision>(
    x: ArrayView2<F>,
    w: ArrayView2<F>,
    b: ArrayView1<F>,
    gamma: ArrayView1<F>,
    beta: ArrayView1<F>,
    bn_state: &mut BatchNormState<F>,
    dropout_param: &mut DropoutParam,
) -> Result<(Array2<F>, AffineNormReluDropoutCache<F>)> {
    let (a, fc_bn_relu) = affine_norm_relu_forward(x, w, b, gamma, beta, bn_state)?;
    let (out, dropout) = dropout_forward(a.view(), dropout_param);
    Ok((out, AffineNormReluDropoutCache { fc_bn_relu, dropout }))
}

/// dropout⁻¹ → affine-batchnorm-relu⁻¹, returns `(dx, dw, db, dgamma, dbeta)`.
#[allow(clippy::type_complexity)]
pub fn affine_norm_relu_dropout_backward<F: Precision>(
    dout: ArrayView2<F>,
    cache: AffineNormReluDropoutCache<F>,
) -> Result<(Array2<F>, Array2<F>, Array1<F>, Array1<F>, Array1<F>)> {
    let AffineNormReluDropoutCache {
        fc_bn_relu,
        dropout,
    } = cache;
    let da = dropout_backward(dout, dropout)?;
    affine_norm_relu_backward(da.view(), fc_bn_relu)
}
