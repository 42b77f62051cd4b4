use ndarray::{Array2, ArrayView2, Zip};

use super::ensure_size;
use crate::{Precision, Result};

/// The relu backward pass only needs to know which inputs were positive.
#[derive(Debug, Clone)]
pub struct ReluCache<F> {
    x: Array2<F>,
}

/// Computes `max(0, x)` element wise.
pub fn relu_forward<F: Precision>(x: ArrayView2<F>) -> (Array2<F>, ReluCache<F>) {
    let out = x.mapv(|v| v.max(F::zero()));
    (out, ReluCache { x: x.to_owned() })
}

/// Backward pass of `relu_forward`, the gradient only flows through the positive inputs.
pub fn relu_backward<F: Precision>(dout: ArrayView2<F>, cache: ReluCache<F>) -> Result<Array2<F>> {
    let ReluCache { x } = cache;
    ensure_size("upstream gradient rows", "relu input rows", dout.nrows(), x.nrows())?;
    ensure_size("upstream gradient columns", "relu input columns", dout.ncols(), x.ncols())?;

    let mut dx = dout.to_owned();
    Zip::from(&mut dx).and(&x).for_each(|d, &v| {
        if v <= F::zero() {
            *d = F::zero();
        }
    });

    Ok(dx)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_relu_zeroes_negatives_and_their_gradient() {
        let x = array![[-1.0, 0.0, 2.0], [3.0, -0.5, 0.25]];
        let (out, cache) = relu_forward(x.view());
        assert_eq!(out, array![[0.0, 0.0, 2.0], [3.0, 0.0, 0.25]]);

        let dout = array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]];
        let dx = relu_backward(dout.view(), cache).unwrap();
        assert_eq!(dx, array![[0.0, 0.0, 1.0], [2.0, 0.0, 2.0]]);
    }

    #[test]
    fn test_relu_backward_rejects_wrong_shape() {
        let x = array![[1.0, 2.0]];
        let (_, cache) = relu_forward(x.view());
        let dout = array![[1.0, 2.0, 3.0]];
        assert!(relu_backward(dout.view(), cache).is_err());
    }
}
