pub mod def;
pub mod json;
pub mod placement;

pub use placement::{DieArea, Macro, ModelError, PlacementModel, PlacementStatus, Point};
