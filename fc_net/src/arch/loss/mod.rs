mod loss_fn;
mod softmax;

pub use loss_fn::LossFn;
pub use softmax::{Softmax, ensure_labels, softmax_loss};
