use ndarray::{Array2, ArrayView2};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, distr::StandardUniform, rngs::StdRng};

use super::ensure_size;
use crate::{MlErr, Mode, Precision, Result};

/// The configuration of a dropout stage: drop probability, mode and randomness source.
///
/// With a seed, every train mode forward pass reseeds from it and so draws the very same mask
/// for the same input shape, which is what makes dropout networks gradient checkable. Without
/// one, masks come from this parameter's own generator.
///
/// A seeded parameter shared by several layers hands every layer of the same width the same
/// mask within one pass, so seeded masks are correlated across equally wide layers.
#[derive(Debug, Clone)]
pub struct DropoutParam {
    pub mode: Mode,
    p: f64,
    seed: Option<u64>,
    rng: StdRng,
}

impl DropoutParam {
    /// Creates a new `DropoutParam` in train mode.
    ///
    /// # Arguments
    /// * `p` - The probability of dropping each activation, in `[0, 1)`.
    /// * `seed` - An optional seed making every mask reproducible.
    ///
    /// # Returns
    /// A new `DropoutParam` or an error if `p` is out of range.
    pub fn new(p: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(MlErr::InvalidDropout { p });
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            mode: Mode::Train,
            p,
            seed,
            rng,
        })
    }

    /// The probability of dropping each activation.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// The seed masks are drawn from, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Draws an inverted dropout mask: kept entries hold `1 / (1 - p)`, dropped ones hold zero.
    fn mask<F: Precision>(&mut self, shape: (usize, usize)) -> Array2<F> {
        let draws: Array2<f64> = match self.seed {
            Some(seed) => Array2::random_using(shape, StandardUniform, &mut StdRng::seed_from_u64(seed)),
            None => Array2::random_using(shape, StandardUniform, &mut self.rng),
        };

        let scale = F::cast(1.0 / (1.0 - self.p));
        let p = self.p;
        draws.mapv(|u| if u >= p { scale } else { F::zero() })
    }
}

/// What the dropout backward pass needs, the scaled mask or nothing if the stage was the
/// identity.
#[derive(Debug, Clone)]
pub struct DropoutCache<F> {
    mask: Option<Array2<F>>,
}

/// Applies inverted dropout to `x` in train mode, and is the identity in test mode.
pub fn dropout_forward<F: Precision>(
    x: ArrayView2<F>,
    param: &mut DropoutParam,
) -> (Array2<F>, DropoutCache<F>) {
    match param.mode {
        Mode::Train => {
            let mask = param.mask(x.dim());
            let out = &x * &mask;
            (out, DropoutCache { mask: Some(mask) })
        }
        Mode::Test => (x.to_owned(), DropoutCache { mask: None }),
    }
}

/// Backward pass of `dropout_forward`, the gradient flows through the kept activations only.
pub fn dropout_backward<F: Precision>(
    dout: ArrayView2<F>,
    cache: DropoutCache<F>,
) -> Result<Array2<F>> {
    let Some(mask) = cache.mask else {
        return Ok(dout.to_owned());
    };

    ensure_size("upstream gradient rows", "dropout mask rows", dout.nrows(), mask.nrows())?;
    ensure_size("upstream gradient columns", "dropout mask columns", dout.ncols(), mask.ncols())?;

    Ok(&dout * &mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_forward_drops_and_rescales() {
        let x = Array2::<f64>::ones((200, 50));
        let mut param = DropoutParam::new(0.25, Some(7)).unwrap();

        let (out, _) = dropout_forward(x.view(), &mut param);

        let scale = 1.0 / 0.75;
        assert!(out.iter().all(|&v| v == 0.0 || (v - scale).abs() < 1e-12));

        let kept = out.iter().filter(|&&v| v != 0.0).count() as f64 / out.len() as f64;
        assert!((kept - 0.75).abs() < 0.03, "kept fraction {kept}");
        assert!((out.mean().unwrap() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_test_forward_is_identity() {
        let x = Array2::from_shape_fn((3, 4), |(i, j)| (i * 4 + j) as f64);
        let mut param = DropoutParam::new(0.5, None).unwrap();
        param.mode = Mode::Test;

        let (out, cache) = dropout_forward(x.view(), &mut param);
        assert_eq!(out, x);

        let dout = Array2::from_elem((3, 4), 2.0);
        assert_eq!(dropout_backward(dout.view(), cache).unwrap(), dout);
    }

    #[test]
    fn test_seeded_masks_repeat_across_calls() {
        let x = Array2::<f64>::ones((10, 10));
        let mut param = DropoutParam::new(0.5, Some(42)).unwrap();

        let (a, _) = dropout_forward(x.view(), &mut param);
        let (b, _) = dropout_forward(x.view(), &mut param);
        assert_eq!(a, b);
        assert_eq!(param.seed(), Some(42));
        assert_eq!(param.p(), 0.5);
    }

    #[test]
    fn test_unseeded_masks_differ_across_calls() {
        let x = Array2::<f64>::ones((10, 10));
        let mut param = DropoutParam::new(0.5, None).unwrap();

        let (a, _) = dropout_forward(x.view(), &mut param);
        let (b, _) = dropout_forward(x.view(), &mut param);
        assert_ne!(a, b);
        assert_eq!(param.seed(), None);
    }

    #[test]
    fn test_backward_reuses_forward_mask() {
        let x = Array2::<f64>::ones((6, 6));
        let mut param = DropoutParam::new(0.3, Some(3)).unwrap();

        let (out, cache) = dropout_forward(x.view(), &mut param);
        let dx = dropout_backward(x.view(), cache).unwrap();
        assert_eq!(dx, out);
    }

    #[test]
    fn test_new_rejects_out_of_range_probability() {
        assert!(matches!(
            DropoutParam::new(1.0, None),
            Err(MlErr::InvalidDropout { .. })
        ));
        assert!(DropoutParam::new(-0.1, None).is_err());
        assert!(DropoutParam::new(f64::NAN, None).is_err());
    }
}
