//! Numeric gradient checking.
//!
//! Analytic gradients are compared against central differences
//! `(f(p + h) - f(p - h)) / 2h` of the model's own loss, one parameter entry at a time. This is
//! slow and meant for small networks in `f64`.

use log::debug;
use ndarray::{ArrayD, ArrayView1, ArrayView2, ArrayViewD, IxDyn, Zip};

use crate::{MlErr, Model, Precision, Result, params::ParamKey};

/// Differences at or below this are numerical noise and never count as errors.
pub const DEFAULT_ATOL: f64 = 1e-8;

/// The outcome of checking the gradient of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradCheck {
    pub key: ParamKey,
    /// The largest absolute difference between analytic and numeric entries.
    pub max_abs_err: f64,
    /// The largest relative difference among entries whose absolute difference exceeds the
    /// tolerance the check ran with.
    pub max_rel_err: f64,
}

impl GradCheck {
    pub fn passes(&self, rtol: f64) -> bool {
        self.max_rel_err <= rtol
    }
}

/// The largest entry wise relative error `|a - b| / max(1e-8, |a| + |b|)`.
pub fn rel_error<F: Precision>(a: ArrayViewD<F>, b: ArrayViewD<F>) -> Result<f64> {
    if a.shape() != b.shape() {
        return Err(MlErr::SizeMismatch {
            a: "first array",
            b: "second array",
            got: a.len(),
            expected: b.len(),
        });
    }

    let mut max = 0.0f64;
    Zip::from(&a).and(&b).for_each(|&a, &b| {
        let (a, b) = (a.widen(), b.widen());
        max = max.max((a - b).abs() / (a.abs() + b.abs()).max(1e-8));
    });

    Ok(max)
}

/// Computes the numeric gradient of the model's train mode loss with respect to one parameter.
///
/// The parameter is restored to its original value entry by entry, so the model is left as it
/// was found, except for whatever running statistics train mode passes update.
///
/// # Arguments
/// * `model` - The model to differentiate.
/// * `x` - The input batch.
/// * `y` - The labels.
/// * `key` - The parameter to differentiate with respect to.
/// * `h` - The step of the central difference.
pub fn numeric_gradient<F, M>(
    model: &mut M,
    x: ArrayView2<F>,
    y: ArrayView1<usize>,
    key: ParamKey,
    h: f64,
) -> Result<ArrayD<F>>
where
    F: Precision,
    M: Model<F> + ?Sized,
{
    let shape = model
        .params()
        .get(key)
        .ok_or(MlErr::UnknownParam(key))?
        .raw_dim();
    let mut grad = ArrayD::zeros(shape.clone());
    let h = F::cast(h);

    for idx in ndarray::indices(shape) {
        let old = replace(model, key, &idx, None)?;

        replace(model, key, &idx, Some(old + h))?;
        let (f_plus, _) = model.loss_and_grads(x, y)?;

        replace(model, key, &idx, Some(old - h))?;
        let (f_minus, _) = model.loss_and_grads(x, y)?;

        replace(model, key, &idx, Some(old))?;
        grad[idx] = (f_plus - f_minus) / (h + h);
    }

    Ok(grad)
}

/// Writes `value` into one entry of a parameter if given, returning the entry's previous value.
fn replace<F, M>(model: &mut M, key: ParamKey, idx: &IxDyn, value: Option<F>) -> Result<F>
where
    F: Precision,
    M: Model<F> + ?Sized,
{
    let mut param = model
        .params_mut()
        .get_mut(key)
        .ok_or(MlErr::UnknownParam(key))?;
    let entry = &mut param[idx.clone()];
    let old = *entry;
    if let Some(value) = value {
        *entry = value;
    }

    Ok(old)
}

/// Checks the analytic gradient of every parameter of a model against its numeric gradient.
///
/// # Arguments
/// * `model` - The model to check. Any dropout must be seeded for the loss to be a function.
/// * `x` - The input batch.
/// * `y` - The labels.
/// * `h` - The step of the central difference.
/// * `atol` - Absolute differences at or below this are ignored by the relative error.
///
/// # Returns
/// One `GradCheck` per parameter, in key order.
pub fn check_gradients<F, M>(
    model: &mut M,
    x: ArrayView2<F>,
    y: ArrayView1<usize>,
    h: f64,
    atol: f64,
) -> Result<Vec<GradCheck>>
where
    F: Precision,
    M: Model<F> + ?Sized,
{
    let (_, analytic) = model.loss_and_grads(x, y)?;
    let mut checks = Vec::new();

    for key in model.params().keys() {
        let numeric = numeric_gradient(model, x, y, key, h)?;
        let analytic = analytic.get(key).ok_or(MlErr::UnknownParam(key))?;
        if analytic.shape() != numeric.shape() {
            return Err(MlErr::SizeMismatch {
                a: "analytic gradient",
                b: "numeric gradient",
                got: analytic.len(),
                expected: numeric.len(),
            });
        }

        let mut max_abs_err = 0.0f64;
        let mut max_rel_err = 0.0f64;
        Zip::from(&analytic).and(&numeric).for_each(|&a, &n| {
            let (a, n) = (a.widen(), n.widen());
            let diff = (a - n).abs();
            max_abs_err = max_abs_err.max(diff);
            if diff > atol {
                max_rel_err = max_rel_err.max(diff / (a.abs() + n.abs()));
            }
        });

        debug!(key:% = key, max_abs_err = max_abs_err, max_rel_err = max_rel_err; "checked gradient");
        checks.push(GradCheck {
            key,
            max_abs_err,
            max_rel_err,
        });
    }

    Ok(checks)
}
