//! Map descriptors: where a competition can run.

use serde::{Deserialize, Serialize};

use crate::CompetitionError;

/// How a map backs competitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    /// A pre-built location. Backs exactly one competition, created at boot.
    Fixed,
    /// A region copied on demand. Each competition gets its own instance,
    /// counted against the arena's dynamic-instance quota.
    Template,
}

/// An axis-aligned block region, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl Bounds {
    pub fn new(min: [i32; 3], max: [i32; 3]) -> Self {
        Self { min, max }
    }

    /// `true` when `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.iter().zip(self.max.iter()).all(|(lo, hi)| lo <= hi)
    }

    /// Edge lengths in blocks. Only meaningful for valid bounds.
    pub fn size(&self) -> [u32; 3] {
        let mut size = [0; 3];
        for (axis, len) in size.iter_mut().enumerate() {
            *len = self.max[axis].abs_diff(self.min[axis]) + 1;
        }
        size
    }
}

/// An immutable record describing one map of an arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDescriptor {
    pub name: String,
    pub kind: MapKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl MapDescriptor {
    pub fn fixed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MapKind::Fixed,
            bounds: None,
        }
    }

    pub fn template(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            kind: MapKind::Template,
            bounds: Some(bounds),
        }
    }

    pub fn is_template(&self) -> bool {
        self.kind == MapKind::Template
    }

    /// Load-time validation. A template without bounds cannot be copied,
    /// so it is rejected here rather than at provisioning time.
    pub fn validate(&self) -> Result<(), CompetitionError> {
        if self.name.trim().is_empty() {
            return Err(CompetitionError::EmptyMapName);
        }
        match (&self.kind, &self.bounds) {
            (MapKind::Template, None) => Err(CompetitionError::MissingBounds {
                map: self.name.clone(),
            }),
            (_, Some(bounds)) if !bounds.is_valid() => Err(CompetitionError::InvalidBounds {
                map: self.name.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// A provisioned copy of a template map, handed out by the provisioning
/// backend and handed back to it when the competition goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInstance {
    /// Backend-assigned id, unique among live instances.
    pub id: u64,
    /// Name of the template this was copied from.
    pub map: String,
    /// Where the copy was placed.
    pub origin: [i32; 3],
}
