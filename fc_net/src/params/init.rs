use log::trace;
use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::Normal;

use super::{LayerParams, ScaleShift};
use crate::{MlErr, Precision, Result};

/// Generates the initial parameters of a network.
///
/// Weights are sampled from a zero mean normal distribution, biases and shifts start at zero
/// and scales start at one. Sampling happens in `f64` and the result is cast to the model's
/// precision afterwards. The generator owns its random number generator, so two models built
/// from the same seed start from identical parameters.
pub struct ParamGen {
    rng: StdRng,
    distribution: Normal<f64>,
}

impl ParamGen {
    /// Creates a new `ParamGen`.
    ///
    /// # Arguments
    /// * `weight_scale` - The standard deviation of the weights.
    /// * `seed` - The seed for the weights.
    ///
    /// # Returns
    /// A new `ParamGen` or an error if `weight_scale` is negative or not finite.
    pub fn new(weight_scale: f64, seed: u64) -> Result<Self> {
        let invalid = MlErr::InvalidWeightScale {
            scale: weight_scale,
        };
        if !weight_scale.is_finite() || weight_scale < 0.0 {
            return Err(invalid);
        }

        let distribution = Normal::new(0.0, weight_scale).map_err(|_| invalid)?;

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            distribution,
        })
    }

    /// Samples a `(fan_in, fan_out)` weight matrix.
    pub fn weights<F: Precision>(&mut self, fan_in: usize, fan_out: usize) -> Array2<F> {
        let w: Array2<f64> = Array2::random_using((fan_in, fan_out), self.distribution, &mut self.rng);
        w.mapv(F::cast)
    }

    /// Generates the parameters of one affine layer.
    ///
    /// # Arguments
    /// * `fan_in` - The width of the layer's input.
    /// * `fan_out` - The width of the layer's output.
    /// * `normalized` - Whether the layer also needs a scale and a shift.
    pub fn layer<F: Precision>(
        &mut self,
        fan_in: usize,
        fan_out: usize,
        normalized: bool,
    ) -> LayerParams<F> {
        trace!(fan_in = fan_in, fan_out = fan_out, normalized = normalized; "generating layer");

        let norm = normalized.then(|| ScaleShift {
            gamma: Array1::ones(fan_out),
            beta: Array1::zeros(fan_out),
        });

        LayerParams {
            w: self.weights(fan_in, fan_out),
            b: Array1::zeros(fan_out),
            norm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_parameters() {
        let a: LayerParams<f64> = ParamGen::new(0.1, 3).unwrap().layer(4, 5, true);
        let b: LayerParams<f64> = ParamGen::new(0.1, 3).unwrap().layer(4, 5, true);
        let c: LayerParams<f64> = ParamGen::new(0.1, 4).unwrap().layer(4, 5, true);

        assert_eq!(a, b);
        assert_ne!(a.w, c.w);
    }

    #[test]
    fn test_layer_layout() {
        let layer: LayerParams<f32> = ParamGen::new(1e-2, 0).unwrap().layer(3, 7, true);

        assert_eq!(layer.dim(), (3, 7));
        assert_eq!(layer.b, Array1::<f32>::zeros(7));
        let norm = layer.norm.unwrap();
        assert_eq!(norm.gamma, Array1::<f32>::ones(7));
        assert_eq!(norm.beta, Array1::<f32>::zeros(7));
    }

    #[test]
    fn test_weight_scale_is_the_standard_deviation() {
        let w: Array2<f64> = ParamGen::new(0.5, 11).unwrap().weights(200, 100);
        let n = w.len() as f64;
        let mean = w.sum() / n;
        let std = (w.mapv(|v| (v - mean).powi(2)).sum() / n).sqrt();

        assert!(mean.abs() < 0.02);
        assert!((std - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_rejects_invalid_weight_scale() {
        assert!(ParamGen::new(-1.0, 0).is_err());
        assert!(ParamGen::new(f64::INFINITY, 0).is_err());
    }
}
