use std::{env, error::Error, fs};

use log::{info, warn};
use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

use fc_net::{
    Evaluation,
    builder::ModelBuilder,
    configs::{FullyConnectedConfig, ModelConfig},
    gradient_check::{DEFAULT_ATOL, check_gradients},
};

const BATCH_SIZE: usize = 8;
const DATA_SEED: u64 = 42;
const STEP: f64 = 1e-5;
const RTOL: f64 = 1e-5;

/// Builds the model described by the json file given as first argument, or a small default
/// one, evaluates it on a random batch and checks its gradients.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => ModelConfig::from_json(&fs::read_to_string(path)?)?,
        None => ModelConfig::FullyConnected(FullyConnectedConfig {
            hidden_dims: vec![10, 8],
            input_dim: 6,
            num_classes: 4,
            dropout: 0.25,
            use_batchnorm: true,
            reg: 1e-2,
            weight_scale: 5e-2,
            dropout_seed: Some(DATA_SEED),
            ..Default::default()
        }),
    };
    info!("using config {}", config.to_json()?);

    let mut model = ModelBuilder::new().build::<f64>(&config)?;
    let input_dim = model
        .params()
        .layer(1)
        .map(|layer| layer.w.nrows())
        .unwrap_or_default();
    let num_classes = model.num_classes();

    let mut rng = StdRng::seed_from_u64(DATA_SEED);
    let x = Array2::<f64>::random_using((BATCH_SIZE, input_dim), StandardNormal, &mut rng);
    let y = Array1::from_iter((0..BATCH_SIZE).map(|i| i % num_classes));

    if let Evaluation::Loss { loss, .. } = model.loss(x.view(), Some(y.view()))? {
        info!("loss on a random batch: {loss}");
    }
    if let Evaluation::Scores(scores) = model.loss(x.view(), None)? {
        info!("scores of the first sample: {}", scores.row(0));
    }

    for check in check_gradients(model.as_mut(), x.view(), y.view(), STEP, DEFAULT_ATOL)? {
        if check.passes(RTOL) {
            info!("{} relative error {:e}", check.key, check.max_rel_err);
        } else {
            warn!("{} relative error {:e} exceeds {RTOL:e}", check.key, check.max_rel_err);
        }
    }

    Ok(())
}
