use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::ensure_size;
use crate::{MlErr, Mode, Precision, Result};

/// The per layer state of a batch normalization stage.
///
/// It carries the mode the next forward pass runs in and the exponentially averaged statistics
/// used at test time. Each model owns one of these per normalized layer, so statistics never
/// leak between layers or between models.
#[derive(Debug, Clone)]
pub struct BatchNormState<F> {
    pub mode: Mode,
    momentum: F,
    eps: F,
    running_mean: Array1<F>,
    running_var: Array1<F>,
}

impl<F: Precision> BatchNormState<F> {
    /// Creates a new `BatchNormState` in train mode, with a zero running mean and a running
    /// variance of one.
    ///
    /// # Arguments
    /// * `dim` - The amount of features being normalized.
    /// * `momentum` - The weight of the old running statistics on each update.
    /// * `eps` - Added to the variance before taking its square root.
    ///
    /// # Returns
    /// A new `BatchNormState` or an error if any argument is out of range.
    pub fn new(dim: usize, momentum: f64, eps: f64) -> Result<Self> {
        if dim == 0 {
            return Err(MlErr::ZeroDimension {
                what: "normalized feature count",
            });
        }
        if !(0.0..=1.0).contains(&momentum) {
            return Err(MlErr::InvalidMomentum { momentum });
        }
        if !eps.is_finite() || eps <= 0.0 {
            return Err(MlErr::InvalidEpsilon { eps });
        }

        Ok(Self {
            mode: Mode::Train,
            momentum: F::cast(momentum),
            eps: F::cast(eps),
            running_mean: Array1::zeros(dim),
            running_var: Array1::ones(dim),
        })
    }

    /// The exponentially averaged per feature mean.
    pub fn running_mean(&self) -> ArrayView1<'_, F> {
        self.running_mean.view()
    }

    /// The exponentially averaged per feature variance.
    pub fn running_var(&self) -> ArrayView1<'_, F> {
        self.running_var.view()
    }

    fn dim(&self) -> usize {
        self.running_mean.len()
    }
}

/// What the batchnorm backward pass needs.
///
/// The mode is kept because a test mode forward pass normalizes with constants, which makes
/// its input gradient a plain rescaling.
#[derive(Debug, Clone)]
pub struct BatchNormCache<F> {
    mode: Mode,
    x_hat: Array2<F>,
    inv_std: Array1<F>,
    gamma: Array1<F>,
}

/// Normalizes every feature of `x` and then scales and shifts it by `gamma` and `beta`.
///
/// In train mode the batch statistics are used and the running statistics of `state` are
/// updated in place, in test mode the running statistics are used and left untouched.
///
/// # Arguments
/// * `x` - The input of shape `(N, D)`.
/// * `gamma` - The per feature scale of shape `(D,)`.
/// * `beta` - The per feature shift of shape `(D,)`.
/// * `state` - This layer's mode and running statistics.
///
/// # Returns
/// The output of shape `(N, D)` and its cache.
pub fn batchnorm_forward<F: Precision>(
    x: ArrayView2<F>,
    gamma: ArrayView1<F>,
    beta: ArrayView1<F>,
    state: &mut BatchNormState<F>,
) -> Result<(Array2<F>, BatchNormCache<F>)> {
    let d = x.ncols();
    ensure_size("gamma", "input columns", gamma.len(), d)?;
    ensure_size("beta", "input columns", beta.len(), d)?;
    ensure_size("running statistics", "input columns", state.dim(), d)?;

    let (x_hat, inv_std) = match state.mode {
        Mode::Train => {
            let n = x.nrows();
            if n == 0 {
                return Err(MlErr::EmptyBatch);
            }

            let n = F::cast(n as f64);
            let mean = x.sum_axis(Axis(0)) / n;
            let centered = &x - &mean;
            let var = centered.mapv(|v| v * v).sum_axis(Axis(0)) / n;
            let inv_std = var.mapv(|v| (v + state.eps).sqrt().recip());

            let momentum = state.momentum;
            let keep = F::one() - momentum;
            state
                .running_mean
                .zip_mut_with(&mean, |r, &m| *r = momentum * *r + keep * m);
            state
                .running_var
                .zip_mut_with(&var, |r, &v| *r = momentum * *r + keep * v);

            (centered * &inv_std, inv_std)
        }
        Mode::Test => {
            let inv_std = state.running_var.mapv(|v| (v + state.eps).sqrt().recip());
            ((&x - &state.running_mean) * &inv_std, inv_std)
        }
    };

    let out = &x_hat * &gamma + &beta;
    let cache = BatchNormCache {
        mode: state.mode,
        x_hat,
        inv_std,
        gamma: gamma.to_owned(),
    };

    Ok((out, cache))
}

/// Backward pass of `batchnorm_forward`.
///
/// # Arguments
/// * `dout` - The upstream gradient of shape `(N, D)`.
/// * `cache` - The cache produced by the forward pass.
///
/// # Returns
/// The gradients `(dx, dgamma, dbeta)`.
pub fn batchnorm_backward<F: Precision>(
    dout: ArrayView2<F>,
    cache: BatchNormCache<F>,
) -> Result<(Array2<F>, Array1<F>, Array1<F>)> {
    let BatchNormCache {
        mode,
        x_hat,
        inv_std,
        gamma,
    } = cache;
    ensure_size("upstream gradient rows", "batchnorm input rows", dout.nrows(), x_hat.nrows())?;
    ensure_size("upstream gradient columns", "batchnorm input columns", dout.ncols(), x_hat.ncols())?;

    let dbeta = dout.sum_axis(Axis(0));
    let dgamma = (&dout * &x_hat).sum_axis(Axis(0));
    let dx_hat = &dout * &gamma;

    let dx = match mode {
        Mode::Train => {
            // dx = inv_std / N * (N * dx_hat - sum(dx_hat) - x_hat * sum(dx_hat * x_hat))
            let n = F::cast(dout.nrows() as f64);
            let sum_dx_hat = dx_hat.sum_axis(Axis(0));
            let sum_dx_hat_x_hat = (&dx_hat * &x_hat).sum_axis(Axis(0));

            let dx = dx_hat * n - &sum_dx_hat - &x_hat * &sum_dx_hat_x_hat;
            dx * &(inv_std / n)
        }
        Mode::Test => dx_hat * &inv_std,
    };

    Ok((dx, dgamma, dbeta))
}
