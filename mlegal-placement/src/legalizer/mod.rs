use mlegal_common::PlacementModel;

use crate::error::LegalizeError;

pub mod force;
pub mod sequential;


pub use force::ForceRelaxationLegalizer;
pub use sequential::SequentialLegalizer;

/// What a single committed step did to the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Number of macros whose position changed
    pub moved: usize,
}

/// Abstract interface over legalizers. A legalizer advances a [PlacementModel] one step at a
/// time, and the driver decides how many steps make a run.
pub trait Legalizer {
    /// Perform step number `iteration` against `model`. Either every displacement of the step is
    /// committed, or an error is returned and `model` is untouched.
    fn step(
        &self,
        model: &mut PlacementModel,
        iteration: usize,
    ) -> Result<StepReport, LegalizeError>;

    /// Number of steps a full run against `model` takes.
    fn schedule_len(&self, model: &PlacementModel) -> usize;
}
