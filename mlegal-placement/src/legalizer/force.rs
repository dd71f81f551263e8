//! Force relaxation legalizer.
//!
//! Every step treats macros as bodies connected by two kinds of force:
//!   - a repulsion between every pair whose halo-expanded footprints overlap, proportional to the
//!     shallower of the two axis overlaps and directed along the line between their centers
//!   - a spring pulling each macro back toward its position in a fixed reference layout,
//!     proportional to the distance from it
//!
//! The summed force is added directly to each position (unit time step) and the result is
//! clamped so the macro stays inside the die area. Nothing here checks for convergence; the
//! driver picks the number of steps.

use itertools::Itertools;
use mlegal_common::{PlacementModel, Point};
use nalgebra::Vector2;

use crate::{
    config::{ForceConfig, GeometryConfig},
    error::LegalizeError,
    history::Snapshot,
};

use super::{Legalizer, StepReport};

/// Below this length a vector has no usable direction.
const DEGENERATE_DISTANCE: f64 = 1e-6;

pub struct ForceRelaxationLegalizer {
    geometry: GeometryConfig,
    params: ForceConfig,
    /// Rest positions the springs pull toward. Stays fixed for the whole run.
    reference: Snapshot,
}

fn to_vector(p: Point) -> Vector2<f64> {
    Vector2::new(p.x as f64, p.y as f64)
}

impl ForceRelaxationLegalizer {
    pub fn new(geometry: GeometryConfig, params: ForceConfig, reference: Snapshot) -> Self {
        Self {
            geometry,
            params,
            reference,
        }
    }

    /// Repulsion between overlapping pairs, accumulated per macro.
    fn repulsion(&self, positions: &[Vector2<f64>], forces: &mut [Vector2<f64>]) {
        let width = self.geometry.macro_width as f64;
        let height = self.geometry.macro_height as f64;
        let halo = self.geometry.halo as f64;

        for (i, j) in (0..positions.len()).tuple_combinations() {
            // Both footprints share an extent and a halo offset, so the lower left delta is also
            // the delta between centers.
            let delta = positions[j] - positions[i];

            let overlap_x = width + 2.0 * halo - delta.x.abs();
            let overlap_y = height + 2.0 * halo - delta.y.abs();
            if overlap_x <= 0.0 || overlap_y <= 0.0 {
                continue;
            }

            let direction = if delta.norm() < DEGENERATE_DISTANCE {
                Vector2::new(1.0, 0.0)
            } else {
                delta.normalize()
            };

            let magnitude = self.params.overlap_force * overlap_x.min(overlap_y);
            forces[i] -= direction * magnitude;
            forces[j] += direction * magnitude;
        }
    }

    /// Spring force from each macro toward its reference position.
    fn restoration(
        &self,
        positions: &[Vector2<f64>],
        rest: &[Vector2<f64>],
        forces: &mut [Vector2<f64>],
    ) {
        for ((pos, rest), force) in positions.iter().zip(rest.iter()).zip(forces.iter_mut()) {
            let to_rest = rest - pos;
            let distance = to_rest.norm();
            if distance > DEGENERATE_DISTANCE {
                *force += (to_rest / distance) * (self.params.spring_force * distance);
            }
        }
    }
}

impl Legalizer for ForceRelaxationLegalizer {
    fn step(
        &self,
        model: &mut PlacementModel,
        iteration: usize,
    ) -> Result<StepReport, LegalizeError> {
        let _span = tracing::info_span!("force_step", iteration).entered();

        self.geometry.validate()?;
        self.params.validate()?;
        model.die_area.validate()?;
        if model.is_empty() {
            return Err(LegalizeError::EmptyPlacement);
        }

        let rest = model
            .iter()
            .map(|m| {
                self.reference
                    .position_of(&m.id)
                    .map(to_vector)
                    .ok_or_else(|| LegalizeError::MissingReference(m.id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let positions = model.iter().map(|m| to_vector(m.position)).collect_vec();

        let mut forces = vec![Vector2::zeros(); positions.len()];
        self.repulsion(&positions, &mut forces);
        self.restoration(&positions, &rest, &mut forces);

        let die = model.die_area;
        let max_x = (die.upper_right.x as i128 - self.geometry.macro_width as i128) as f64;
        let max_y = (die.upper_right.y as i128 - self.geometry.macro_height as i128) as f64;
        let min_x = die.lower_left.x as f64;
        let min_y = die.lower_left.y as f64;

        let mut moved = 0;
        for (idx, (pos, force)) in positions.iter().zip(forces.iter()).enumerate() {
            let next = pos + force;
            // A die narrower than a macro pins it to the lower left edge. The float to integer
            // cast saturates at the i64 bounds.
            let target = Point::new(
                next.x.min(max_x).max(min_x) as i64,
                next.y.min(max_y).max(min_y) as i64,
            );

            if target != model.macros()[idx].position {
                moved += 1;
                model.set_position(idx, target);
            }
        }

        log::debug!("Force step {} moved {} macros", iteration, moved);

        Ok(StepReport { moved })
    }

    fn schedule_len(&self, _model: &PlacementModel) -> usize {
        self.params.iterations
    }
}
