use log::{debug, info, trace, warn};
use ndarray::{Array2, ArrayView1, ArrayView2};

use super::{
    Model,
    blocks::{BlockCache, HiddenBlock},
    layers::{AffineCache, BatchNormState, DropoutParam, affine_backward, affine_forward},
    loss::{LossFn, Softmax, ensure_labels},
};
use crate::{
    MlErr, Mode, Precision, Result,
    configs::{FullyConnectedConfig, ensure_nonzero, ensure_reg},
    params::{Gradients, LayerParams, ParamGen, ParamStore},
};

/// A fully connected network with an arbitrary amount of hidden layers:
///
/// `{affine → [batchnorm] → relu → [dropout]} x (L - 1) → affine → softmax`
///
/// Whether the hidden layers normalize and drop out is decided once when the network is built.
/// The network owns one set of running statistics per hidden layer and a single dropout
/// parameter shared by every hidden layer.
#[derive(Debug, Clone)]
pub struct FullyConnectedNet<F> {
    params: ParamStore<F>,
    block: HiddenBlock,
    bn_states: Vec<BatchNormState<F>>,
    dropout: Option<DropoutParam>,
    reg: F,
    mode: Mode,
    num_classes: usize,
}

/// The caches of one forward pass, kept until the backward pass consumes them.
struct ForwardCaches<F> {
    hidden: Vec<BlockCache<F>>,
    output: AffineCache<F>,
}

impl<F: Precision> FullyConnectedNet<F> {
    /// Creates a new `FullyConnectedNet`.
    ///
    /// # Arguments
    /// * `config` - The architecture, initialization and regularization of the network.
    ///
    /// # Returns
    /// A new `FullyConnectedNet` or an error if the configuration is invalid.
    pub fn new(config: &FullyConnectedConfig) -> Result<Self> {
        let FullyConnectedConfig {
            hidden_dims,
            input_dim,
            num_classes,
            dropout,
            use_batchnorm,
            reg,
            weight_scale,
            init_seed,
            dropout_seed,
            bn_momentum,
            bn_eps,
        } = config;

        ensure_nonzero("input dimension", *input_dim)?;
        ensure_nonzero("number of classes", *num_classes)?;
        for &dim in hidden_dims {
            ensure_nonzero("hidden dimension", dim)?;
        }
        ensure_reg(*reg)?;

        let dropout = match *dropout {
            p if p == 0.0 => None,
            p => Some(DropoutParam::new(p, *dropout_seed)?),
        };
        let block = HiddenBlock::resolve(*use_batchnorm, dropout.is_some());

        let mut param_gen = ParamGen::new(*weight_scale, *init_seed)?;
        let mut layers = Vec::with_capacity(hidden_dims.len() + 1);
        let mut bn_states = Vec::new();
        let mut fan_in = *input_dim;

        for &fan_out in hidden_dims {
            layers.push(param_gen.layer(fan_in, fan_out, block.uses_batchnorm()));
            if block.uses_batchnorm() {
                bn_states.push(BatchNormState::new(fan_out, *bn_momentum, *bn_eps)?);
            }
            fan_in = fan_out;
        }
        layers.push(param_gen.layer(fan_in, *num_classes, false));

        info!(
            layers = layers.len(), block:? = block, precision = F::NAME;
            "built fully connected net with hidden dims {hidden_dims:?}"
        );

        Ok(Self {
            params: ParamStore::new(layers),
            block,
            bn_states,
            dropout,
            reg: F::cast(*reg),
            mode: Mode::Train,
            num_classes: *num_classes,
        })
    }

    /// The pipeline the hidden layers run through.
    pub fn block(&self) -> HiddenBlock {
        self.block
    }

    /// The running statistics of each hidden layer, empty without batch normalization.
    pub fn bn_states(&self) -> &[BatchNormState<F>] {
        &self.bn_states
    }

    /// The dropout parameter shared by the hidden layers, if dropout is enabled.
    pub fn dropout(&self) -> Option<&DropoutParam> {
        self.dropout.as_ref()
    }

    /// Sets the mode of this call on the network and on every stateful stage before any layer
    /// runs, so every layer of one call behaves the same way.
    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        for state in &mut self.bn_states {
            state.mode = mode;
        }
        if let Some(dropout) = &mut self.dropout {
            dropout.mode = mode;
        }
    }

    fn forward(&mut self, x: ArrayView2<F>) -> Result<(Array2<F>, ForwardCaches<F>)> {
        let (output, hidden) = self
            .params
            .layers()
            .split_last()
            .ok_or(MlErr::ZeroDimension {
                what: "number of layers",
            })?;

        let mut caches = Vec::with_capacity(hidden.len());
        let mut bn_states = self.bn_states.iter_mut();
        let mut h = x.to_owned();

        for (i, layer) in hidden.iter().enumerate() {
            let (out, cache) = self.block.forward(
                i + 1,
                h.view(),
                layer,
                bn_states.next(),
                self.dropout.as_mut(),
            )?;
            caches.push(cache);
            h = out;
        }

        trace!(layer = self.params.num_layers(); "output layer forward");
        let (scores, output) = affine_forward(h.view(), output.w.view(), output.b.view())?;

        let caches = ForwardCaches {
            hidden: caches,
            output,
        };

        Ok((scores, caches))
    }
}

impl<F: Precision> Model<F> for FullyConnectedNet<F> {
    fn params(&self) -> &ParamStore<F> {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamStore<F> {
        &mut self.params
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn scores(&mut self, x: ArrayView2<F>) -> Result<Array2<F>> {
        self.set_mode(Mode::Test);
        let (scores, _) = self.forward(x)?;
        Ok(scores)
    }

    fn loss_and_grads(&mut self, x: ArrayView2<F>, y: ArrayView1<usize>) -> Result<(F, Gradients<F>)> {
        // rejected labels must not move running statistics or dropout streams
        ensure_labels(y, x.nrows(), self.num_classes)?;
        self.set_mode(Mode::Train);
        let (scores, caches) = self.forward(x)?;

        let (data_loss, dscores) = Softmax.loss(scores.view(), y)?;
        let reg_loss = F::cast(0.5) * self.reg * self.params.weight_norm_sq();
        let loss = data_loss + reg_loss;

        let ForwardCaches { hidden, output } = caches;
        let mut grads = Vec::with_capacity(hidden.len() + 1);

        let (mut dh, dw, db) = affine_backward(dscores.view(), output)?;
        grads.push(LayerParams {
            w: dw,
            b: db,
            norm: None,
        });

        for cache in hidden.into_iter().rev() {
            let (dx, layer_grads) = cache.backward(dh.view())?;
            grads.push(layer_grads);
            dh = dx;
        }
        grads.reverse();

        let mut grads = ParamStore::new(grads);
        grads.add_weight_decay(&self.params, self.reg);

        if !loss.is_finite() {
            warn!("fully connected net loss is not finite: {loss}");
        }
        debug!(
            batch = x.nrows(), block:? = self.block, data_loss = data_loss.widen(), reg_loss = reg_loss.widen();
            "fully connected net loss"
        );

        Ok((loss, grads))
    }
}
