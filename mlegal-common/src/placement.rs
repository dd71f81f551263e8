//! In-memory placement model: the die area and the macros placed inside it.

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// A point in design length units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Squared distance from the origin. Exact, and monotone with the Euclidean distance.
    pub fn norm_squared(&self) -> u128 {
        let (x, y) = (self.x.unsigned_abs() as u128, self.y.unsigned_abs() as u128);
        x * x + y * y
    }
}

impl From<(i64, i64)> for Point {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i64, i64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned region all macros must remain within.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieArea {
    pub lower_left: Point,
    pub upper_right: Point,
}

impl DieArea {
    pub fn new(lower_left: Point, upper_right: Point) -> Self {
        Self {
            lower_left,
            upper_right,
        }
    }

    /// Check that the upper right corner is strictly above and to the right of the lower left.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.upper_right.x > self.lower_left.x && self.upper_right.y > self.lower_left.y {
            Ok(())
        } else {
            Err(ModelError::MalformedDieArea {
                lower_left: self.lower_left,
                upper_right: self.upper_right,
            })
        }
    }
}

/// Whether the upstream placement allows the macro to move. Carried through legalization
/// untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementStatus {
    #[serde(rename = "FIXED")]
    Fixed,
    #[serde(rename = "PLACED")]
    Placed,
}

impl PlacementStatus {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "FIXED" => Some(Self::Fixed),
            "PLACED" => Some(Self::Placed),
            _ => None,
        }
    }
}

/// A placed macro, positioned by its lower left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macro {
    /// Hierarchical instance name. Unique within a [PlacementModel].
    pub id: String,
    /// Library cell name of the macro.
    pub kind: String,
    pub position: Point,
    pub orientation: String,
    pub status: PlacementStatus,
    /// Reporting annotation only, marks the macro a step is currently working on.
    pub highlighted: bool,
}

impl Macro {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position,
            orientation: "N".to_owned(),
            status: PlacementStatus::Placed,
            highlighted: false,
        }
    }
}

/// Macro fields as they appear in a persisted model, keyed externally by the instance name.
#[derive(Serialize, Deserialize)]
struct MacroRecord {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Point,
    status: PlacementStatus,
    orientation: String,
    #[serde(default)]
    highlighted: bool,
}

/// Error generated when the structure of a [PlacementModel] would be violated
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelError {
    DuplicateMacro(String),
    MalformedDieArea { lower_left: Point, upper_right: Point },
    UnknownMacro(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateMacro(id) => write!(f, "macro {:?} is defined more than once", id),
            Self::MalformedDieArea {
                lower_left,
                upper_right,
            } => write!(
                f,
                "die area upper right {} is not strictly above and right of lower left {}",
                upper_right, lower_left
            ),
            Self::UnknownMacro(id) => write!(f, "no macro named {:?}", id),
        }
    }
}

impl std::error::Error for ModelError {}

/// The die area plus every macro in it. Macros keep the order they were inserted in, and can be
/// looked up by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementModel {
    pub die_area: DieArea,
    macros: Vec<Macro>,
    index: HashMap<String, usize>,
}

impl PlacementModel {
    pub fn new(die_area: DieArea) -> Self {
        Self {
            die_area,
            macros: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a macro at the end of the model order.
    pub fn insert(&mut self, m: Macro) -> Result<(), ModelError> {
        if self.index.contains_key(&m.id) {
            return Err(ModelError::DuplicateMacro(m.id));
        }
        self.index.insert(m.id.clone(), self.macros.len());
        self.macros.push(m);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Macro> {
        self.index.get(id).map(|&i| &self.macros[i])
    }

    pub fn position_of(&self, id: &str) -> Result<Point, ModelError> {
        self.get(id)
            .map(|m| m.position)
            .ok_or_else(|| ModelError::UnknownMacro(id.to_owned()))
    }

    /// Macros in model order. Ids cannot be changed through this slice since the index would go
    /// stale, so it is only handed out immutably.
    pub fn macros(&self) -> &[Macro] {
        &self.macros
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.iter()
    }

    /// Move the macro at `idx` (in model order) to `position`.
    pub fn set_position(&mut self, idx: usize, position: Point) {
        self.macros[idx].position = position;
    }

    /// Set the highlight annotation on the macro at `idx`. Highlights set earlier are kept.
    pub fn highlight(&mut self, idx: usize) {
        self.macros[idx].highlighted = true;
    }
}

impl Serialize for PlacementModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            die_area: &'a DieArea,
            macros: MacroMap<'a>,
        }

        Repr {
            die_area: &self.die_area,
            macros: MacroMap(&self.macros),
        }
        .serialize(serializer)
    }
}

struct MacroMap<'a>(&'a [Macro]);

impl<'a> Serialize for MacroMap<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for m in self.0 {
            map.serialize_entry(
                &m.id,
                &MacroRecord {
                    kind: m.kind.clone(),
                    coordinates: m.position,
                    status: m.status,
                    orientation: m.orientation.clone(),
                    highlighted: m.highlighted,
                },
            )?;
        }
        map.end()
    }
}

/// Deserializes the macro map in document order, which a `HashMap` would lose.
struct OrderedMacros(Vec<Macro>);

impl<'de> Deserialize<'de> for OrderedMacros {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MacroVisitor;

        impl<'de> Visitor<'de> for MacroVisitor {
            type Value = OrderedMacros;

            fn expecting(&self, f: &mut Formatter) -> fmt::Result {
                write!(f, "a map from macro name to macro record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut macros = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, record)) = access.next_entry::<String, MacroRecord>()? {
                    macros.push(Macro {
                        id,
                        kind: record.kind,
                        position: record.coordinates,
                        orientation: record.orientation,
                        status: record.status,
                        highlighted: record.highlighted,
                    });
                }
                Ok(OrderedMacros(macros))
            }
        }

        deserializer.deserialize_map(MacroVisitor)
    }
}

impl<'de> Deserialize<'de> for PlacementModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Repr {
            die_area: DieArea,
            macros: OrderedMacros,
        }

        let repr = Repr::deserialize(deserializer)?;
        repr.die_area.validate().map_err(serde::de::Error::custom)?;

        let mut model = PlacementModel::new(repr.die_area);
        for m in repr.macros.0 {
            model.insert(m).map_err(serde::de::Error::custom)?;
        }
        Ok(model)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn small_model() -> PlacementModel {
        let mut model = PlacementModel::new(DieArea::new(Point::new(0, 0), Point::new(1000, 500)));
        model
            .insert(Macro::new("top/u_sram_b", "sram_64x32", Point::new(300, 0)))
            .unwrap();
        model
            .insert(Macro::new("top/u_sram_a", "sram_64x32", Point::new(0, 100)))
            .unwrap();
        model
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut model = small_model();
        let err = model
            .insert(Macro::new("top/u_sram_a", "sram_64x32", Point::new(5, 5)))
            .expect_err("Duplicate insert unexpectedly succeeded");

        assert_eq!(err, ModelError::DuplicateMacro("top/u_sram_a".to_owned()));
        assert_eq!(model.len(), 2);
        assert_eq!(model.position_of("top/u_sram_a"), Ok(Point::new(0, 100)));
    }

    #[test]
    fn die_area_must_have_positive_extent() {
        assert!(DieArea::new(Point::new(0, 0), Point::new(10, 10))
            .validate()
            .is_ok());
        assert!(DieArea::new(Point::new(0, 0), Point::new(0, 10))
            .validate()
            .is_err());
        assert!(DieArea::new(Point::new(5, 5), Point::new(10, 4))
            .validate()
            .is_err());
    }

    #[test]
    fn highlights_accumulate() {
        let mut model = small_model();
        model.highlight(0);
        model.highlight(1);

        assert!(model.get("top/u_sram_b").unwrap().highlighted);
        assert!(model.get("top/u_sram_a").unwrap().highlighted);
    }

    #[test]
    fn norm_squared_covers_the_full_coordinate_range() {
        assert_eq!(Point::new(-3, 4).norm_squared(), 25);
        assert_eq!(
            Point::new(i64::MIN, i64::MIN).norm_squared(),
            2 * (1u128 << 126)
        );
    }

    #[test]
    fn json_keeps_document_order() {
        let model = small_model();
        let encoded = serde_json::to_string(&model).unwrap();

        assert!(encoded.starts_with(
            r#"{"die_area":{"lower_left":[0,0],"upper_right":[1000,500]},"macros":{"top/u_sram_b":"#
        ));

        let decoded: PlacementModel = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, model);
        let ids: Vec<_> = decoded.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["top/u_sram_b", "top/u_sram_a"]);
    }

    #[test]
    fn json_without_highlight_defaults_to_false() {
        let decoded: PlacementModel = serde_json::from_str(
            r#"{
                "die_area": {"lower_left": [0, 0], "upper_right": [10, 10]},
                "macros": {
                    "u0": {"type": "ram", "coordinates": [1, 2], "status": "FIXED", "orientation": "FN"}
                }
            }"#,
        )
        .unwrap();

        let m = decoded.get("u0").unwrap();
        assert_eq!(m.position, Point::new(1, 2));
        assert_eq!(m.status, PlacementStatus::Fixed);
        assert_eq!(m.orientation, "FN");
        assert!(!m.highlighted);
    }

    #[test]
    fn json_with_inverted_die_area_fails() {
        let result = serde_json::from_str::<PlacementModel>(
            r#"{"die_area": {"lower_left": [10, 10], "upper_right": [0, 0]}, "macros": {}}"#,
        );
        assert!(result.is_err());
    }
}
