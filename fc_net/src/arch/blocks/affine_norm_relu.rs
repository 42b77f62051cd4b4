use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{
    Precision, Result,
    arch::layers::{
        AffineCache, BatchNormCache, BatchNormState, ReluCache, affine_backward, affine_forward,
        batchnorm_backward, batchnorm_forward, relu_backward, relu_forward,
    },
};

#[derive(Debug, Clone)]
pub struct AffineNormReluCache<F> {
    fc: AffineCache<F>,
    bn: BatchNormCache<F>,
    relu: ReluCache<F>,
}

/// affine → batchnorm → relu.
///
/// # Arguments
/// * `x` - The input of shape `(N, D)`.
/// * `w`, `b` - The affine weights `(D, M)` and biases `(M,)`.
/// * `gamma`, `beta` - The normalization scale and shift, both `(M,)`.
/// * `bn_state` - This layer's normalization mode and running statistics.
pub fn affine_norm_relu_forward<F: Precision>(
    x: ArrayView2<F>,
    w: ArrayView2<F>,
    b: ArrayView1<F>,
    gamma: ArrayView1<F>,
    beta: ArrayView1<F>,
    bn_state: &mut BatchNormState<F>,
) -> Result<(Array2<F>, AffineNormReluCache<F>)> {
    let (a, fc) = affine_forward(x, w, b)?;
    let (normalized, bn) = batchnorm_forward(a.view(), gamma, beta, bn_state)?;
    let (out, relu) = relu_forward(normalized.view());
    Ok((out, AffineNormReluCache { fc, bn, relu }))
}

/// relu⁻¹ → batchnorm⁻¹ → affine⁻¹, returns `(dx, dw, db, dgamma, dbeta)`.
#[allow(clippy::type_complexity)]
pub fn affine_norm_relu_backward<F: Precision>(
    dout: ArrayView2<F>,
    cache: AffineNormReluCache<F>,
) -> Result<(Array2<F>, Array2<F>, Array1<F>, Array1<F>, Array1<F>)> {
    let AffineNormReluCache { fc, bn, relu } = cache;
    let dnormalized = relu_backward(dout, relu)?;
    let (da, dgamma, dbeta) = batchnorm_backward(dnormalized.view(), bn)?;
    let (dx, dw, db) = affine_backward(da.view(), fc)?;
    Ok((dx, dw, db, dgamma, dbeta))
}
