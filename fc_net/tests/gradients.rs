use ndarray::{Array1, Array2, ArrayD};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

use fc_net::{
    FullyConnectedNet, Model, TwoLayerNet,
    configs::{FullyConnectedConfig, TwoLayerConfig},
    gradient_check::{DEFAULT_ATOL, check_gradients, numeric_gradient, rel_error},
    params::ParamKey,
};

const STEP: f64 = 1e-5;
const RTOL: f64 = 1e-5;

fn batch(n: usize, d: usize, num_classes: usize) -> (Array2<f64>, Array1<usize>) {
    let mut rng = StdRng::seed_from_u64(231);
    let x = Array2::random_using((n, d), StandardNormal, &mut rng);
    let y = Array1::from_iter((0..n).map(|i| i % num_classes));
    (x, y)
}

fn assert_gradients_match<M: Model<f64>>(model: &mut M, x: &Array2<f64>, y: &Array1<usize>) {
    let checks = check_gradients(model, x.view(), y.view(), STEP, DEFAULT_ATOL).unwrap();
    assert_eq!(checks.len(), model.params().keys().len());

    for check in checks {
        assert!(
            check.passes(RTOL),
            "{} relative error {:e}, absolute error {:e}",
            check.key,
            check.max_rel_err,
            check.max_abs_err
        );
    }
}

fn fc_config(use_batchnorm: bool, dropout: f64, reg: f64) -> FullyConnectedConfig {
    FullyConnectedConfig {
        hidden_dims: vec![7, 5],
        input_dim: 4,
        num_classes: 3,
        dropout,
        use_batchnorm,
        reg,
        weight_scale: 5e-1,
        init_seed: 17,
        dropout_seed: Some(123),
        ..Default::default()
    }
}

#[test]
fn two_layer_net_gradients_match_numeric_ones() {
    let (x, y) = batch(5, 4, 3);

    for reg in [0.0, 0.5] {
        let mut net = TwoLayerNet::<f64>::new(&TwoLayerConfig {
            input_dim: 4,
            hidden_dim: 10,
            num_classes: 3,
            weight_scale: 5e-1,
            reg,
            init_seed: 7,
        })
        .unwrap();

        assert_gradients_match(&mut net, &x, &y);
    }
}

#[test]
fn plain_network_gradients_match_numeric_ones() {
    let (x, y) = batch(6, 4, 3);

    for reg in [0.0, 2.5] {
        let mut net = FullyConnectedNet::<f64>::new(&fc_config(false, 0.0, reg)).unwrap();
        assert_gradients_match(&mut net, &x, &y);
    }
}

#[test]
fn batchnorm_network_gradients_match_numeric_ones() {
    let (x, y) = batch(6, 4, 3);

    for reg in [0.0, 0.7] {
        let mut net = FullyConnectedNet::<f64>::new(&fc_config(true, 0.0, reg)).unwrap();
        assert_gradients_match(&mut net, &x, &y);
    }
}

#[test]
fn dropout_network_gradients_match_numeric_ones() {
    let (x, y) = batch(6, 4, 3);

    for p in [0.25, 0.5] {
        let mut net = FullyConnectedNet::<f64>::new(&fc_config(false, p, 0.0)).unwrap();
        assert_gradients_match(&mut net, &x, &y);
    }
}

#[test]
fn batchnorm_dropout_network_gradients_match_numeric_ones() {
    let (x, y) = batch(6, 4, 3);
    let mut net = FullyConnectedNet::<f64>::new(&fc_config(true, 0.3, 0.1)).unwrap();
    assert_gradients_match(&mut net, &x, &y);
}

#[test]
fn single_affine_network_gradients_match_numeric_ones() {
    let (x, y) = batch(5, 4, 3);
    let mut net = FullyConnectedNet::<f64>::new(&FullyConnectedConfig {
        hidden_dims: vec![],
        ..fc_config(true, 0.0, 0.2)
    })
    .unwrap();

    assert_gradients_match(&mut net, &x, &y);
}

#[test]
fn numeric_gradient_leaves_parameters_untouched() {
    let (x, y) = batch(5, 4, 3);
    let mut net = FullyConnectedNet::<f64>::new(&fc_config(true, 0.0, 0.0)).unwrap();
    let before = net.params().clone();

    let key = ParamKey::gamma(2);
    let numeric = numeric_gradient(&mut net, x.view(), y.view(), key, STEP).unwrap();
    let (_, grads) = net.loss_and_grads(x.view(), y.view()).unwrap();

    for key in before.keys() {
        assert_eq!(net.params().get(key), before.get(key), "{key}");
    }
    assert!(rel_error(numeric.view(), grads.get(key).unwrap()).unwrap() < RTOL);
}

#[test]
fn unknown_keys_are_rejected() {
    let (x, y) = batch(5, 4, 3);
    let mut net = FullyConnectedNet::<f64>::new(&fc_config(false, 0.0, 0.0)).unwrap();

    let err = numeric_gradient(&mut net, x.view(), y.view(), ParamKey::gamma(1), STEP);
    assert!(err.is_err());

    let err = rel_error(
        ArrayD::<f64>::zeros(vec![2, 3]).view(),
        ArrayD::<f64>::zeros(vec![3, 2]).view(),
    );
    assert!(err.is_err());
}
