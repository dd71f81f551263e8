//! Overlap and displacement statistics over an [IterationHistory].

use itertools::Itertools;
use mlegal_common::PlacementModel;
use serde::Serialize;

use crate::{
    config::GeometryConfig,
    history::{IterationHistory, Snapshot},
    overlap::halo_overlap,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlapStatistics {
    /// Index of the snapshot in the history, the starting placement being 0
    pub iteration: usize,
    /// Number of macro pairs whose bare footprints (no halo) overlap
    pub overlap_count: usize,
    /// Sum of pairwise intersection areas, in square design units
    pub total_overlap_area: i128,
    /// Sum over all macros of the distance from their starting position
    pub total_displacement: f64,
    /// Largest distance any macro has moved from its starting position
    pub max_displacement: f64,
}

fn snapshot_statistics(
    iteration: usize,
    model: &PlacementModel,
    original: &Snapshot,
    geometry: &GeometryConfig,
) -> OverlapStatistics {
    let (overlap_count, total_overlap_area) = model
        .macros()
        .iter()
        .tuple_combinations()
        .map(|(a, b)| {
            halo_overlap(
                a.position,
                b.position,
                geometry.macro_width,
                geometry.macro_height,
                0,
            )
        })
        .filter(|o| o.is_overlapping())
        .fold((0, 0i128), |(count, area), o| {
            (count + 1, area.saturating_add(o.area()))
        });

    let displacements = model
        .iter()
        .filter_map(|m| {
            original.position_of(&m.id).map(|p| {
                let dx = (m.position.x as i128 - p.x as i128) as f64;
                let dy = (m.position.y as i128 - p.y as i128) as f64;
                dx.hypot(dy)
            })
        })
        .collect_vec();

    OverlapStatistics {
        iteration,
        overlap_count,
        total_overlap_area,
        total_displacement: displacements.iter().sum(),
        max_displacement: displacements.iter().copied().fold(0.0, f64::max),
    }
}

/// One row of statistics per snapshot, measured against the first snapshot.
pub fn overlap_statistics(
    history: &IterationHistory,
    geometry: &GeometryConfig,
) -> Vec<OverlapStatistics> {
    history
        .iter()
        .enumerate()
        .map(|(i, snapshot)| snapshot_statistics(i, snapshot.model(), history.original(), geometry))
        .collect()
}

/// Emit the statistics as a table through the log.
pub fn log_statistics(stats: &[OverlapStatistics]) {
    log::info!(
        "{:>9} {:>8} {:>20} {:>16} {:>14}",
        "iteration",
        "overlaps",
        "overlap area",
        "displacement",
        "max moved"
    );
    for s in stats {
        log::info!(
            "{:>9} {:>8} {:>20} {:>16.1} {:>14.1}",
            s.iteration,
            s.overlap_count,
            s.total_overlap_area,
            s.total_displacement,
            s.max_displacement
        );
    }
}
