use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The configuration of a `TwoLayerNet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoLayerConfig {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub num_classes: usize,
    /// The standard deviation of the initial weights.
    pub weight_scale: f64,
    /// The L2 regularization strength.
    pub reg: f64,
    /// Seeds the initial weights, equal seeds build equal networks.
    pub init_seed: u64,
}

impl Default for TwoLayerConfig {
    fn default() -> Self {
        Self {
            input_dim: 3 * 32 * 32,
            hidden_dim: 100,
            num_classes: 10,
            weight_scale: 1e-3,
            reg: 0.0,
            init_seed: 0,
        }
    }
}

/// The configuration of a `FullyConnectedNet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullyConnectedConfig {
    /// The width of each hidden layer, the network has `hidden_dims.len() + 1` affine layers.
    pub hidden_dims: Vec<usize>,
    pub input_dim: usize,
    pub num_classes: usize,
    /// The probability of dropping each hidden activation, zero disables dropout.
    pub dropout: f64,
    pub use_batchnorm: bool,
    /// The L2 regularization strength.
    pub reg: f64,
    /// The standard deviation of the initial weights.
    pub weight_scale: f64,
    /// Seeds the initial weights, equal seeds build equal networks.
    pub init_seed: u64,
    /// Makes every dropout mask reproducible when set.
    pub dropout_seed: Option<u64>,
    pub bn_momentum: f64,
    pub bn_eps: f64,
}

impl Default for FullyConnectedConfig {
    fn default() -> Self {
        Self {
            hidden_dims: vec![100, 100],
            input_dim: 3 * 32 * 32,
            num_classes: 10,
            dropout: 0.0,
            use_batchnorm: false,
            reg: 0.0,
            weight_scale: 1e-2,
            init_seed: 0,
            dropout_seed: None,
            bn_momentum: 0.9,
            bn_eps: 1e-5,
        }
    }
}

/// The configuration of any of the models, as read from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelConfig {
    TwoLayer(TwoLayerConfig),
    FullyConnected(FullyConnectedConfig),
}

impl ModelConfig {
    /// Parses a `ModelConfig` from its json representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes this configuration as pretty json.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fails if `value` is zero.
pub(crate) fn ensure_nonzero(what: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(MlErr::ZeroDimension { what });
    }

    Ok(())
}

/// Fails if the regularization strength is negative or not finite.
pub(crate) fn ensure_reg(reg: f64) -> Result<()> {
    if !reg.is_finite() || reg < 0.0 {
        return Err(MlErr::InvalidRegularization { reg });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_connected_config_fills_defaults() {
        let json = r#"{ "model": "fully_connected", "hidden_dims": [20, 30], "dropout": 0.5 }"#;

        let ModelConfig::FullyConnected(config) = ModelConfig::from_json(json).unwrap() else {
            panic!("expected a fully connected config");
        };

        assert_eq!(config.hidden_dims, vec![20, 30]);
        assert_eq!(config.dropout, 0.5);
        assert_eq!(config.input_dim, 3072);
        assert_eq!(config.bn_momentum, 0.9);
        assert_eq!(config.dropout_seed, None);
    }

    #[test]
    fn test_two_layer_config_round_trips() {
        let config = ModelConfig::TwoLayer(TwoLayerConfig {
            input_dim: 4,
            hidden_dim: 10,
            num_classes: 3,
            ..Default::default()
        });

        let json = config.to_json().unwrap();
        assert!(json.contains("\"model\": \"two_layer\""));
        assert_eq!(ModelConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_unknown_model_is_a_config_error() {
        let err = ModelConfig::from_json(r#"{ "model": "convolutional" }"#).unwrap_err();
        assert!(matches!(err, MlErr::Config(_)));
    }
}
