use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::params::ParamKey;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    LabelOutOfRange {
        label: usize,
        num_classes: usize,
    },
    EmptyBatch,
    ZeroDimension {
        what: &'static str,
    },
    InvalidDropout {
        p: f64,
    },
    InvalidWeightScale {
        scale: f64,
    },
    InvalidRegularization {
        reg: f64,
    },
    InvalidMomentum {
        momentum: f64,
    },
    InvalidEpsilon {
        eps: f64,
    },
    MissingLayerState {
        layer: usize,
        what: &'static str,
    },
    InvalidParamKey(String),
    UnknownParam(ParamKey),
    Config(serde_json::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => format!(
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            MlErr::LabelOutOfRange { label, num_classes } => {
                format!("Label {label} is out of range for {num_classes} classes")
            }
            MlErr::EmptyBatch => "The given batch has no samples".to_string(),
            MlErr::ZeroDimension { what } => format!("The {what} must be greater than zero"),
            MlErr::InvalidDropout { p } => {
                format!("The dropout probability must be in [0, 1), got {p}")
            }
            MlErr::InvalidWeightScale { scale } => {
                format!("The weight scale must be finite and non negative, got {scale}")
            }
            MlErr::InvalidRegularization { reg } => {
                format!("The regularization strength must be finite and non negative, got {reg}")
            }
            MlErr::InvalidMomentum { momentum } => {
                format!("The batchnorm momentum must be in [0, 1], got {momentum}")
            }
            MlErr::InvalidEpsilon { eps } => {
                format!("The batchnorm epsilon must be finite and positive, got {eps}")
            }
            MlErr::MissingLayerState { layer, what } => {
                format!("Layer {layer} runs a block that needs {what}, but has none")
            }
            MlErr::InvalidParamKey(key) => format!("Failed to parse parameter key `{key}`"),
            MlErr::UnknownParam(key) => format!("The model has no parameter named {key}"),
            MlErr::Config(e) => format!("Failed to read the model configuration: {e}"),
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MlErr {
    fn from(e: serde_json::Error) -> Self {
        MlErr::Config(e)
    }
}
