use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{
    Precision, Result,
    arch::layers::{AffineCache, ReluCache, affine_backward, affine_forward, relu_backward, relu_forward},
};

#[derive(Debug, Clone)]
pub struct AffineReluCache<F> {
    fc: AffineCache<F>,
    relu: ReluCache<F>,
}

/// affine → relu.
pub fn affine_relu_forward<F: Precision>(
    x: ArrayView2<F>,
    w: ArrayView2<F>,
    b: ArrayView1<F>,
) -> Result<(Array2<F>, AffineReluCache<F>)> {
    let (a, fc) = affine_forward(x, w, b)?;
    let (out, relu) = relu_forward(a.view());
    Ok((out, AffineReluCache { fc, relu }))
}

/// relu⁻¹ → affine⁻¹, returns `(dx, dw, db)`.
pub fn affine_relu_backward<F: Precision>(
    dout: ArrayView2<F>,
    cache: AffineReluCache<F>,
) -> Result<(Array2<F>, Array2<F>, Array1<F>)> {
    let AffineReluCache { fc, relu } = cache;
    let da = relu_backward(dout, relu)?;
    affine_backward(da.view(), fc)
}
