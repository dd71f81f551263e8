//! Pairwise overlap of halo-expanded macro footprints.
//!
//! Every macro in a run shares one extent, so a footprint is fully described by its lower left
//! corner. The halo grows the footprint by `halo` on all four sides: the expanded box starts at
//! `position - halo` and is `width + 2 * halo` by `height + 2 * halo`.
//!
//! Lengths are computed in `i128` so any pair of `i64` coordinates and extents is representable.

use mlegal_common::Point;

use crate::config::GeometryConfig;

/// Intersection lengths of two footprints along each axis. Either component may be zero or
/// negative, in which case the footprints are apart along that axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlap {
    pub x: i128,
    pub y: i128,
}

impl Overlap {
    /// True 2-D overlap requires both axes to intersect.
    pub fn is_overlapping(&self) -> bool {
        self.x > 0 && self.y > 0
    }

    /// Intersection area, or zero if the footprints don't overlap.
    pub fn area(&self) -> i128 {
        if self.is_overlapping() {
            self.x.saturating_mul(self.y)
        } else {
            0
        }
    }
}

fn axis_overlap(a: i128, b: i128, extent: i128) -> i128 {
    std::cmp::min(a + extent, b + extent) - std::cmp::max(a, b)
}

/// Overlap of two macros at `p1` and `p2` with the run's extent, each grown by `halo`.
///
/// No special casing for degenerate extents: the same formula is applied, and callers treat a
/// non-positive component as no overlap.
pub fn halo_overlap(p1: Point, p2: Point, width: i64, height: i64, halo: i64) -> Overlap {
    let halo = halo as i128;
    let (x1, y1) = (p1.x as i128 - halo, p1.y as i128 - halo);
    let (x2, y2) = (p2.x as i128 - halo, p2.y as i128 - halo);

    Overlap {
        x: axis_overlap(x1, x2, width as i128 + 2 * halo),
        y: axis_overlap(y1, y2, height as i128 + 2 * halo),
    }
}

/// [halo_overlap] using the run geometry.
pub fn overlap(geometry: &GeometryConfig, p1: Point, p2: Point) -> Overlap {
    halo_overlap(
        p1,
        p2,
        geometry.macro_width,
        geometry.macro_height,
        geometry.halo,
    )
}
