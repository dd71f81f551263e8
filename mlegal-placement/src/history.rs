use mlegal_common::{PlacementModel, Point};
use serde::{Serialize, Serializer};

/// Frozen copy of a [PlacementModel] taken at an iteration boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    model: PlacementModel,
}

impl Snapshot {
    pub fn of(model: &PlacementModel) -> Self {
        Self {
            model: model.clone(),
        }
    }

    pub fn model(&self) -> &PlacementModel {
        &self.model
    }

    /// Position of the macro `id` at the time the snapshot was taken.
    pub fn position_of(&self, id: &str) -> Option<Point> {
        self.model.get(id).map(|m| m.position)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.model.serialize(serializer)
    }
}

/// Append-only log of snapshots, starting with the model the run began from.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct IterationHistory {
    snapshots: Vec<Snapshot>,
}

impl IterationHistory {
    pub fn new(initial: &PlacementModel) -> Self {
        Self {
            snapshots: vec![Snapshot::of(initial)],
        }
    }

    /// Append a copy of `model` and return it.
    pub fn record(&mut self, model: &PlacementModel) -> &Snapshot {
        self.snapshots.push(Snapshot::of(model));
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// The starting configuration.
    pub fn original(&self) -> &Snapshot {
        &self.snapshots[0]
    }

    pub fn latest(&self) -> &Snapshot {
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}
