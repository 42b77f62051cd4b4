//! Single stage layer primitives.
//!
//! Every forward function returns its output together with a cache holding exactly what the
//! matching backward function needs. Backward functions take the cache by value, so a cache
//! can only ever be consumed once.

mod affine;
mod batchnorm;
mod dropout;
mod relu;

pub use affine::{AffineCache, affine_backward, affine_forward};
pub use batchnorm::{BatchNormCache, BatchNormState, batchnorm_backward, batchnorm_forward};
pub use dropout::{DropoutCache, DropoutParam, dropout_backward, dropout_forward};
pub use relu::{ReluCache, relu_backward, relu_forward};

use crate::{MlErr, Result};

/// Fails with a `SizeMismatch` if `got` differs from `expected`.
pub(crate) fn ensure_size(
    a: &'static str,
    b: &'static str,
    got: usize,
    expected: usize,
) -> Result<()> {
    if got != expected {
        return Err(MlErr::SizeMismatch {
            a,
            b,
            got,
            expected,
        });
    }

    Ok(())
}
