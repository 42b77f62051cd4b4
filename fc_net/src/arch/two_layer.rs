use log::{debug, info, warn};
use ndarray::{Array2, ArrayView1, ArrayView2};

use super::{
    Model,
    blocks::{AffineReluCache, affine_relu_backward, affine_relu_forward},
    layers::{AffineCache, affine_backward, affine_forward},
    loss::{LossFn, Softmax, ensure_labels},
};
use crate::{
    MlErr, Mode, Precision, Result,
    configs::{TwoLayerConfig, ensure_nonzero, ensure_reg},
    params::{Gradients, LayerParams, ParamGen, ParamStore},
};

/// A two layer network: affine → relu → affine → softmax.
#[derive(Debug, Clone)]
pub struct TwoLayerNet<F> {
    params: ParamStore<F>,
    reg: F,
    mode: Mode,
    num_classes: usize,
}

impl<F: Precision> TwoLayerNet<F> {
    /// Creates a new `TwoLayerNet`.
    ///
    /// # Arguments
    /// * `config` - The dimensions, weight scale, regularization and seed of the network.
    ///
    /// # Returns
    /// A new `TwoLayerNet` or an error if the configuration is invalid.
    pub fn new(config: &TwoLayerConfig) -> Result<Self> {
        let &TwoLayerConfig {
            input_dim,
            hidden_dim,
            num_classes,
            weight_scale,
            reg,
            init_seed,
        } = config;

        ensure_nonzero("input dimension", input_dim)?;
        ensure_nonzero("hidden dimension", hidden_dim)?;
        ensure_nonzero("number of classes", num_classes)?;
        ensure_reg(reg)?;

        let mut param_gen = ParamGen::new(weight_scale, init_seed)?;
        let params = ParamStore::new(vec![
            param_gen.layer(input_dim, hidden_dim, false),
            param_gen.layer(hidden_dim, num_classes, false),
        ]);

        info!(
            input_dim = input_dim, hidden_dim = hidden_dim, num_classes = num_classes, precision = F::NAME;
            "built two layer net"
        );

        Ok(Self {
            params,
            reg: F::cast(reg),
            mode: Mode::Train,
            num_classes,
        })
    }

    #[allow(clippy::type_complexity)]
    fn forward(
        &self,
        x: ArrayView2<F>,
    ) -> Result<(Array2<F>, AffineReluCache<F>, AffineCache<F>)> {
        let [hidden, output] = self.params.layers() else {
            return Err(MlErr::SizeMismatch {
                a: "two layer net",
                b: "its parameter layers",
                got: self.params.num_layers(),
                expected: 2,
            });
        };

        let (h, hidden_cache) = affine_relu_forward(x, hidden.w.view(), hidden.b.view())?;
        let (scores, output_cache) = affine_forward(h.view(), output.w.view(), output.b.view())?;

        Ok((scores, hidden_cache, output_cache))
    }
}

impl<F: Precision> Model<F> for TwoLayerNet<F> {
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
        self.mode = Mode::Test;
        let (scores, _, _) = self.forward(x)?;
        Ok(scores)
    }

    fn loss_and_grads(&mut self, x: ArrayView2<F>, y: ArrayView1<usize>) -> Result<(F, Gradients<F>)> {
        // rejected labels must not move running statistics or dropout streams
        ensure_labels(y, x.nrows(), self.num_classes)?;
        self.mode = Mode::Train;
        let (scores, hidden_cache, output_cache) = self.forward(x)?;

        let (data_loss, dscores) = Softmax.loss(scores.view(), y)?;
        let reg_loss = F::cast(0.5) * self.reg * self.params.weight_norm_sq();
        let loss = data_loss + reg_loss;

        let (dh, dw2, db2) = affine_backward(dscores.view(), output_cache)?;
        let (_, dw1, db1) = affine_relu_backward(dh.view(), hidden_cache)?;

        let mut grads = ParamStore::new(vec![
            LayerParams {
                w: dw1,
                b: db1,
                norm: None,
            },
            LayerParams {
                w: dw2,
                b: db2,
                norm: None,
            },
        ]);
        grads.add_weight_decay(&self.params, self.reg);

        if !loss.is_finite() {
            warn!("two layer net loss is not finite: {loss}");
        }
        debug!(batch = x.nrows(), data_loss = data_loss.widen(), reg_loss = reg_loss.widen(); "two layer net loss");

        Ok((loss, grads))
    }
}
