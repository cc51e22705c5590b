//! Error types for the competition layer.

use colosseum_types::{CompetitionId, Message, PlayerId};

use crate::PhaseId;

/// Errors that can occur while declaring arenas and maps or while mutating
/// a competition.
#[derive(Debug, thiserror::Error)]
pub enum CompetitionError {
    /// A transition targeted a phase the arena never declared.
    #[error("phase {phase} is not declared by arena {arena}")]
    UnknownPhase { arena: String, phase: PhaseId },

    /// The player is already in this competition's roster.
    #[error("player {0} already in competition {1}")]
    AlreadyInRoster(PlayerId, CompetitionId),

    /// The player is not in this competition's roster.
    #[error("player {0} not in competition {1}")]
    NotInRoster(PlayerId, CompetitionId),

    /// The join rules refused the player at roster-mutation time.
    ///
    /// `can_join` and `join` are not atomic, so a competition that accepted
    /// a player moments ago may have filled up or moved on since.
    #[error("player {player} cannot join competition {competition}: {reason}")]
    JoinRejected {
        player: PlayerId,
        competition: CompetitionId,
        reason: Message,
    },

    /// A template map must declare the region it is copied from.
    #[error("template map {map} has no bounds")]
    MissingBounds { map: String },

    #[error("map {map} has inverted bounds")]
    InvalidBounds { map: String },

    #[error("map name must not be empty")]
    EmptyMapName,

    #[error("arena {arena} declares no phases")]
    NoPhases { arena: String },

    #[error("arena {arena} declares phase {phase} twice")]
    DuplicatePhase { arena: String, phase: PhaseId },

    /// At most one phase per arena may carry the victory capability.
    #[error("arena {arena} declares more than one victory phase")]
    MultipleVictoryPhases { arena: String },
}
