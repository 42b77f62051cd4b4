use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::{AffineReluCache, affine_relu_backward, affine_relu_forward};
use crate::{
    Precision, Result,
    arch::layers::{DropoutCache, DropoutParam, dropout_backward, dropout_forward},
};

#[derive(Debug, Clone)]
pub struct AffineReluDropoutCache<F> {
    fc_relu: AffineReluCache<F>,
    dropout: DropoutCache<F>,
}

/// affine-relu → dropout.
pub fn affine_relu_dropout_forward<F: Precision>(
    x: ArrayView2<F>,
    w: ArrayView2<F>,
    b: ArrayView1<F>,
    dropout_param: &mut DropoutParam,
) -> Result<(Array2<F>, AffineReluDropoutCache<F>)> {
    let (a, fc_relu) = affine_relu_forward(x, w, b)?;
    let (out, dropout) = dropout_forward(a.view(), dropout_param);
    Ok((out, AffineReluDropoutCache { fc_relu, dropout }))
}

/// dropout⁻¹ → affine-relu⁻¹, returns `(dx, dw, db)`.
pub fn affine_relu_dropout_backward<F: Precision>(
    dout: ArrayView2<F>,
    cache: AffineReluDropoutCache<F>,
) -> Result<(Array2<F>, Array2<F>, Array1<F>)> {
    let AffineReluDropoutCache { fc_relu, dropout } = cache;
    let da = dropout_backward(dout, dropout)?;
    affine_relu_backward(da.view(), fc_relu)
}
