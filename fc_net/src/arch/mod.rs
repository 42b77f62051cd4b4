pub mod blocks;
mod fully_connected;
pub mod layers;
pub mod loss;
mod mode;
mod model;
mod two_layer;

pub use fully_connected::FullyConnectedNet;
pub use mode::Mode;
pub use model::{Evaluation, Model};
pub use two_layer::TwoLayerNet;
