//! Convenience blocks chaining layer primitives into a single forward/backward pair.
//!
//! A block's backward pass runs its stages' backward passes in the exact reverse order, each
//! one consuming the cache slice its own forward stage produced.

mod affine_norm_relu;
mod affine_norm_relu_dropout;
mod affine_relu;
mod affine_relu_dropout;
mod hidden;

pub use affine_norm_relu::{AffineNormReluCache, affine_norm_relu_backward, affine_norm_relu_forward};
pub use affine_norm_relu_dropout::{
    AffineNormReluDropoutCache, affine_norm_relu_dropout_backward, affine_norm_relu_dropout_forward,
};
pub use affine_relu::{AffineReluCache, affine_relu_backward, affine_relu_forward};
pub use affine_relu_dropout::{
    AffineReluDropoutCache, affine_relu_dropout_backward, affine_relu_dropout_forward,
};
pub use hidden::{BlockCache, HiddenBlock};
