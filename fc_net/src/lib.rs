pub mod arch;
pub mod builder;
pub mod configs;
pub mod error;
pub mod gradient_check;
pub mod params;
mod precision;

pub use arch::{Evaluation, FullyConnectedNet, Mode, Model, TwoLayerNet};
pub use error::{MlErr, Result};
pub use precision::Precision;
