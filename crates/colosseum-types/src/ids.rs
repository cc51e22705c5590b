//! Identity newtypes.
//!
//! Registries in the engine are tables keyed by these ids. Wrapping the
//! raw `u64` keeps a `CompetitionId` from being passed where an `ArenaId`
//! is expected, even though both are integers underneath.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a player (the requester of a join).
///
/// `#[serde(transparent)]` serializes `PlayerId(42)` as plain `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifies a registered arena type (a category of game activity).
///
/// Assigned by the engine at registration; never reused while the engine
/// is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub u64);

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// Identifies one live competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitionId(pub u64);

impl fmt::Display for CompetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(ArenaId(2).to_string(), "A-2");
        assert_eq!(CompetitionId(11).to_string(), "C-11");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&CompetitionId(5)).unwrap();
        assert_eq!(json, "5");
        let back: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(back, PlayerId(42));
    }
}
