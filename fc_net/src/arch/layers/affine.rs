use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::ensure_size;
use crate::{Precision, Result};

/// What the affine backward pass needs: the input and the weights it was multiplied by.
#[derive(Debug, Clone)]
pub struct AffineCache<F> {
    x: Array2<F>,
    w: Array2<F>,
}

/// Computes `x · w + b`.
///
/// # Arguments
/// * `x` - The input of shape `(N, D)`.
/// * `w` - The weights of shape `(D, M)`.
/// * `b` - The biases of shape `(M,)`.
///
/// # Returns
/// The output of shape `(N, M)` and its cache, or a size mismatch error.
pub fn affine_forward<F: Precision>(
    x: ArrayView2<F>,
    w: ArrayView2<F>,
    b: ArrayView1<F>,
) -> Result<(Array2<F>, AffineCache<F>)> {
    ensure_size("input columns", "weight rows", x.ncols(), w.nrows())?;
    ensure_size("biases", "weight columns", b.len(), w.ncols())?;

    let out = x.dot(&w) + &b;
    let cache = AffineCache {
        x: x.to_owned(),
        w: w.to_owned(),
    };

    Ok((out, cache))
}

/// Backward pass of `affine_forward`.
///
/// # Arguments
/// * `dout` - The upstream gradient of shape `(N, M)`.
/// * `cache` - The cache produced by the forward pass.
///
/// # Returns
/// The gradients `(dx, dw, db)`, shaped like `x`, `w` and `b`.
pub fn affine_backward<F: Precision>(
    dout: ArrayView2<F>,
    cache: AffineCache<F>,
) -> Result<(Array2<F>, Array2<F>, Array1<F>)> {
    let AffineCache { x, w } = cache;
    ensure_size("upstream gradient rows", "input rows", dout.nrows(), x.nrows())?;
    ensure_size("upstream gradient columns", "weight columns", dout.ncols(), w.ncols())?;

    let dx = dout.dot(&w.t());
    let dw = x.t().dot(&dout);
    let db = dout.sum_axis(Axis(0));

    Ok((dx, dw, db))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::MlErr;

    #[test]
    fn test_affine_forward_computes_xw_plus_b() {
        let x: Array2<f64> = array![[1.0, 2.0], [3.0, 4.0]];
        let w: Array2<f64> = array![[1.0, 0.0, -1.0], [0.5, 1.0, 2.0]];
        let b: Array1<f64> = array![0.1, 0.2, 0.3];

        let (out, _) = affine_forward(x.view(), w.view(), b.view()).unwrap();

        let expected: Array2<f64> = array![[2.1, 2.2, 3.3], [5.1, 4.2, 5.3]];
        for (o, e) in out.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_affine_backward_shapes_and_values() {
        let x: Array2<f64> = array![[1.0, 2.0], [3.0, 4.0]];
        let w: Array2<f64> = array![[1.0, 0.0, -1.0], [0.5, 1.0, 2.0]];
        let b: Array1<f64> = array![0.0, 0.0, 0.0];
        let (_, cache) = affine_forward(x.view(), w.view(), b.view()).unwrap();

        let dout = array![[1.0, 1.0, 1.0], [0.0, 1.0, 0.0]];
        let (dx, dw, db) = affine_backward(dout.view(), cache).unwrap();

        assert_eq!(dx, array![[0.0, 3.5], [0.0, 1.0]]);
        assert_eq!(dw, array![[1.0, 4.0, 1.0], [2.0, 6.0, 2.0]]);
        assert_eq!(db, array![1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_affine_forward_rejects_mismatched_input() {
        let x = Array2::<f64>::zeros((2, 3));
        let w = Array2::<f64>::zeros((4, 5));
        let b = Array1::<f64>::zeros(5);

        let err = affine_forward(x.view(), w.view(), b.view()).unwrap_err();
        assert!(matches!(
            err,
            MlErr::SizeMismatch {
                got: 3,
                expected: 4,
                ..
            }
        ));
    }
}
