use ndarray::NdFloat;

/// The floating point types every model, layer and gradient can be computed with.
///
/// Parameters are always sampled in `f64` and then cast down to the model's precision, `f32`
/// trades accuracy for speed while `f64` is the one to use for numeric gradient checking.
pub trait Precision: NdFloat + Default {
    /// A short human readable name for logging.
    const NAME: &'static str;

    /// Casts an `f64` into this precision, possibly losing accuracy.
    fn cast(value: f64) -> Self;

    /// Widens this value into an `f64`.
    fn widen(self) -> f64;
}

impl Precision for f32 {
    const NAME: &'static str = "f32";

    fn cast(value: f64) -> Self {
        value as f32
    }

    fn widen(self) -> f64 {
        self as f64
    }
}

impl Precision for f64 {
    const NAME: &'static str = "f64";

    fn cast(value: f64) -> Self {
        value
    }

    fn widen(self) -> f64 {
        self
    }
}
