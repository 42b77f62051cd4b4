use crate::{
    FullyConnectedNet, Model, Precision, Result, TwoLayerNet,
    configs::{FullyConnectedConfig, ModelConfig, TwoLayerConfig},
};

/// Builds `Model`s given a configuration.
#[derive(Default)]
pub struct ModelBuilder;

impl ModelBuilder {
    /// Creates a new `ModelBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new model following a configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration of the model.
    ///
    /// # Returns
    /// The model, computing in precision `F`, or an error if the configuration is invalid.
    pub fn build<F: Precision>(&self, config: &ModelConfig) -> Result<Box<dyn Model<F>>> {
        match config {
            ModelConfig::TwoLayer(config) => self.two_layer(config),
            ModelConfig::FullyConnected(config) => self.fully_connected(config),
        }
    }

    /// Parses a json configuration and builds the model it describes.
    pub fn build_from_json<F: Precision>(&self, json: &str) -> Result<Box<dyn Model<F>>> {
        self.build(&ModelConfig::from_json(json)?)
    }

    fn two_layer<F: Precision>(&self, config: &TwoLayerConfig) -> Result<Box<dyn Model<F>>> {
        Ok(Box::new(TwoLayerNet::new(config)?))
    }

    fn fully_connected<F: Precision>(
        &self,
        config: &FullyConnectedConfig,
    ) -> Result<Box<dyn Model<F>>> {
        Ok(Box::new(FullyConnectedNet::new(config)?))
    }
}
