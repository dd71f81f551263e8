use std::fmt::{self, Display, Formatter};

use mlegal_common::ModelError;

/// Configuration errors raised by a legalization step. A step that returns one of these has not
/// touched the model.
#[derive(Clone, Debug, PartialEq)]
pub enum LegalizeError {
    EmptyPlacement,
    IterationOutOfRange { iteration: usize, macro_count: usize },
    NonPositiveExtent { width: i64, height: i64 },
    NegativeHalo(i64),
    NonFiniteParameter { name: &'static str, value: f64 },
    /// The reference layout has no entry for a macro of the model being relaxed
    MissingReference(String),
    /// Moving the named macro would take it outside the representable coordinate range
    CoordinateOverflow(String),
    Model(ModelError),
}

impl Display for LegalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPlacement => write!(f, "placement contains no macros"),
            Self::IterationOutOfRange {
                iteration,
                macro_count,
            } => write!(
                f,
                "iteration {} out of range for {} macros",
                iteration, macro_count
            ),
            Self::NonPositiveExtent { width, height } => write!(
                f,
                "macro extent {}x{} must be positive along both axes",
                width, height
            ),
            Self::NegativeHalo(h) => write!(f, "halo {} must not be negative", h),
            Self::NonFiniteParameter { name, value } => {
                write!(f, "parameter {} = {} is not finite", name, value)
            }
            Self::MissingReference(id) => {
                write!(f, "reference layout has no position for macro {:?}", id)
            }
            Self::CoordinateOverflow(id) => {
                write!(f, "moving macro {:?} overflows the coordinate range", id)
            }
            Self::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LegalizeError {}

impl From<ModelError> for LegalizeError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}
