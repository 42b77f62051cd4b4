use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};

use super::{ParamKey, Role};
use crate::Precision;

/// The learnable scale and shift of a batch normalized layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleShift<F> {
    pub gamma: Array1<F>,
    pub beta: Array1<F>,
}

/// The parameters of a single affine layer, plus its scale and shift if it is normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParams<F> {
    pub w: Array2<F>,
    pub b: Array1<F>,
    pub norm: Option<ScaleShift<F>>,
}

impl<F: Precision> LayerParams<F> {
    /// The layer's `(fan_in, fan_out)`.
    pub fn dim(&self) -> (usize, usize) {
        self.w.dim()
    }

    /// The amount of scalars in this layer.
    pub fn size(&self) -> usize {
        let norm = self
            .norm
            .as_ref()
            .map_or(0, |n| n.gamma.len() + n.beta.len());

        self.w.len() + self.b.len() + norm
    }
}

/// The parameters of a whole network, one `LayerParams` per affine layer in forward order.
///
/// Gradients are returned in this very same structure, so a gradient exists for exactly the
/// parameters a model has.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamStore<F> {
    layers: Vec<LayerParams<F>>,
}

/// Gradients share the layout of the parameters they belong to.
pub type Gradients<F> = ParamStore<F>;

impl<F: Precision> ParamStore<F> {
    /// Creates a new `ParamStore` from per layer parameters in forward order.
    pub fn new(layers: Vec<LayerParams<F>>) -> Self {
        Self { layers }
    }

    /// The amount of affine layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// The amount of scalars across all the parameters.
    pub fn num_params(&self) -> usize {
        self.layers.iter().map(LayerParams::size).sum()
    }

    pub fn layers(&self) -> &[LayerParams<F>] {
        &self.layers
    }

    /// Returns the layer with the given one based index.
    pub fn layer(&self, layer: usize) -> Option<&LayerParams<F>> {
        self.layers.get(layer.checked_sub(1)?)
    }

    /// Every parameter key in layer order, weight and bias first and then scale and shift.
    pub fn keys(&self) -> Vec<ParamKey> {
        let mut keys = Vec::with_capacity(self.layers.len() * 4);

        for (i, layer) in self.layers.iter().enumerate() {
            keys.push(ParamKey::weight(i + 1));
            keys.push(ParamKey::bias(i + 1));
            if layer.norm.is_some() {
                keys.push(ParamKey::gamma(i + 1));
                keys.push(ParamKey::beta(i + 1));
            }
        }

        keys
    }

    /// Looks up a parameter array by key.
    pub fn get(&self, key: ParamKey) -> Option<ArrayViewD<'_, F>> {
        let layer = self.layer(key.layer)?;

        let view = match key.role {
            Role::Weight => layer.w.view().into_dyn(),
            Role::Bias => layer.b.view().into_dyn(),
            Role::Gamma => layer.norm.as_ref()?.gamma.view().into_dyn(),
            Role::Beta => layer.norm.as_ref()?.beta.view().into_dyn(),
        };

        Some(view)
    }

    /// Looks up a parameter array by key for writing.
    pub fn get_mut(&mut self, key: ParamKey) -> Option<ArrayViewMutD<'_, F>> {
        let layer = self.layers.get_mut(key.layer.checked_sub(1)?)?;

        let view = match key.role {
            Role::Weight => layer.w.view_mut().into_dyn(),
            Role::Bias => layer.b.view_mut().into_dyn(),
            Role::Gamma => layer.norm.as_mut()?.gamma.view_mut().into_dyn(),
            Role::Beta => layer.norm.as_mut()?.beta.view_mut().into_dyn(),
        };

        Some(view)
    }

    /// The sum of the squared entries of every weight matrix, `Σ ‖Wi‖²`.
    ///
    /// Biases, scales and shifts are not regularized and do not count.
    pub fn weight_norm_sq(&self) -> F {
        self.layers
            .iter()
            .map(|layer| layer.w.iter().fold(F::zero(), |acc, &w| acc + w * w))
            .fold(F::zero(), |acc, s| acc + s)
    }

    /// Adds the L2 penalty gradient `reg · Wi` to every weight gradient, leaving everything
    /// else untouched.
    pub(crate) fn add_weight_decay(&mut self, params: &ParamStore<F>, reg: F) {
        for (grad, param) in self.layers.iter_mut().zip(&params.layers) {
            grad.w.scaled_add(reg, &param.w);
        }
    }
}
