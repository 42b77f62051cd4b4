use serde::{Deserialize, Serialize};

/// Whether a forward pass is part of training or of inference.
///
/// Batch normalization uses batch statistics and updates its running statistics in `Train`
/// mode, and only reads the running statistics in `Test` mode. Dropout is the identity in
/// `Test` mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Train,
    Test,
}
