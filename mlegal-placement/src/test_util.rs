//! Fixture builders shared by the unit tests.

use mlegal_common::{DieArea, Macro, PlacementModel, Point};

use crate::config::GeometryConfig;

pub(crate) fn make_placement<'a>(
    die: ((i64, i64), (i64, i64)),
    macros: impl Iterator<Item = &'a (&'static str, (i64, i64))>,
) -> PlacementModel {
    let mut model = PlacementModel::new(DieArea::new(die.0.into(), die.1.into()));
    for (name, (x, y)) in macros {
        model
            .insert(Macro::new(*name, "sram", Point::new(*x, *y)))
            .unwrap_or_else(|e| panic!("Bad test fixture: {}", e));
    }
    model
}

pub(crate) fn square_geometry(size: i64, halo: i64) -> GeometryConfig {
    GeometryConfig {
        macro_width: size,
        macro_height: size,
        halo,
    }
}

pub(crate) fn pos(model: &PlacementModel, id: &str) -> (i64, i64) {
    model
        .position_of(id)
        .unwrap_or_else(|e| panic!("{}", e))
        .into()
}

macro_rules! placement {
    (
        die : ($llx:expr, $lly:expr) .. ($urx:expr, $ury:expr),
        macros : [
            $($name:ident => ($x:expr, $y:expr);)*
        ]
    ) => {{
        let macros: &[(&'static str, (i64, i64))] = &[
            $(
                (stringify!($name), ($x, $y))
            ),*
        ];

        $crate::test_util::make_placement((($llx, $lly), ($urx, $ury)), macros.iter())
    }};
}
