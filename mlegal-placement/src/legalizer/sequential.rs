//! Greedy sequential legalizer.
//!
//! Macros are ranked by the distance of their lower left corner from the origin. Step `k` takes
//! the macro at rank `k` as the current macro and pushes every later-ranked macro that overlaps
//! it along whichever axis needs the smaller displacement: right by the x overlap, or along +y
//! by the y overlap. Ties go to the y axis. The current macro and everything ranked before it
//! stay put.
//!
//! The ranking is recomputed from the live positions at the start of every step, so a macro that
//! was pushed by an earlier step may change rank.
//!
//! Every move is computed before any is applied. A move that would leave the `i64` coordinate
//! range fails the step with the model untouched.

use itertools::Itertools;
use mlegal_common::{PlacementModel, Point};

use crate::{config::GeometryConfig, error::LegalizeError, overlap::overlap};

use super::{Legalizer, StepReport};

pub struct SequentialLegalizer {
    geometry: GeometryConfig,
}

impl SequentialLegalizer {
    pub fn new(geometry: GeometryConfig) -> Self {
        SequentialLegalizer { geometry }
    }

    /// Model indices ordered by distance from the origin. The sort is stable, so equidistant
    /// macros keep their model order.
    pub fn rank_order(model: &PlacementModel) -> Vec<usize> {
        let macros = model.macros();
        let mut order = (0..macros.len()).collect_vec();
        order.sort_by_key(|&i| macros[i].position.norm_squared());
        order
    }
}

impl Legalizer for SequentialLegalizer {
    fn step(
        &self,
        model: &mut PlacementModel,
        iteration: usize,
    ) -> Result<StepReport, LegalizeError> {
        let _span = tracing::info_span!("sequential_step", iteration).entered();

        self.geometry.validate()?;
        model.die_area.validate()?;
        if model.is_empty() {
            return Err(LegalizeError::EmptyPlacement);
        }
        if iteration >= model.len() {
            return Err(LegalizeError::IterationOutOfRange {
                iteration,
                macro_count: model.len(),
            });
        }

        let order = Self::rank_order(model);
        let current_idx = order[iteration];
        let current = &model.macros()[current_idx];
        let current_pos = current.position;
        log::info!("Current macro: {} at {}", current.id, current_pos);

        // Overlaps are all measured against the current macro, which never moves, so collecting
        // them before applying any move gives the same result as moving as we go.
        let mut moves = Vec::new();
        for &idx in order[iteration + 1..].iter() {
            let m = &model.macros()[idx];
            let o = overlap(&self.geometry, current_pos, m.position);
            if !o.is_overlapping() {
                continue;
            }

            log::debug!(
                "Overlap found between {} and {} ({} x {})",
                current.id,
                m.id,
                o.x,
                o.y
            );

            let (x, y) = if o.x < o.y {
                log::debug!("Moving {} right by {}", m.id, o.x);
                (m.position.x as i128 + o.x, m.position.y as i128)
            } else {
                log::debug!("Moving {} along y by {}", m.id, o.y);
                (m.position.x as i128, m.position.y as i128 + o.y)
            };
            let target = match (i64::try_from(x), i64::try_from(y)) {
                (Ok(x), Ok(y)) => Point::new(x, y),
                _ => return Err(LegalizeError::CoordinateOverflow(m.id.clone())),
            };
            moves.push((idx, target));
        }

        model.highlight(current_idx);
        for &(idx, target) in moves.iter() {
            model.set_position(idx, target);
        }

        Ok(StepReport { moved: moves.len() })
    }

    fn schedule_len(&self, model: &PlacementModel) -> usize {
        model.len()
    }
}
