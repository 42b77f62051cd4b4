mod init;
mod key;
mod store;

pub use init::ParamGen;
pub use key::{ParamKey, Role};
pub use store::{Gradients, LayerParams, ParamStore, ScaleShift};
