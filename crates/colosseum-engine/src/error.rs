//! Error types for the engine layer.

use colosseum_competition::CompetitionError;
use colosseum_types::{ArenaId, CompetitionId, Message, PlayerId};

/// Errors that can occur during registry and roster operations.
///
/// Arbitration (`get_or_create_competition`, `can_join`) never returns
/// these; expected failures there collapse to `None` or a rejected
/// `JoinResult`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("arena {0} does not exist")]
    UnknownArena(String),

    #[error("arena {arena} has no map named {map}")]
    UnknownMap { arena: String, map: String },

    #[error("arena {arena} already has a map named {map}")]
    DuplicateMap { arena: String, map: String },

    #[error("arena {0} is already registered")]
    DuplicateArena(String),

    #[error("competition {0} not found")]
    CompetitionNotFound(CompetitionId),

    #[error("player {0} is not in a competition")]
    NotInArena(PlayerId),

    #[error("player {0} is already in competition {1}")]
    AlreadyInArena(PlayerId, CompetitionId),

    /// A fixed map backs at most one competition.
    #[error("map {map} is already backing competition {competition}")]
    MapInUse {
        map: String,
        competition: CompetitionId,
    },

    #[error("arena {0} reached its dynamic instance limit")]
    QuotaExceeded(ArenaId),

    #[error(transparent)]
    Competition(#[from] CompetitionError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The engine actor has stopped (after shutdown, or it panicked).
    #[error("engine is unavailable")]
    Unavailable,
}

impl EngineError {
    /// The message shown to a player whose request failed with this error.
    pub fn user_message(&self) -> Message {
        match self {
            Self::UnknownArena(arena) => Message::ArenaDoesNotExist {
                arena: arena.clone(),
            },
            Self::UnknownMap { .. } => Message::NoArenaWithName,
            Self::NotInArena(_) => Message::NotInArena,
            Self::AlreadyInArena(..) => Message::AlreadyInArena,
            Self::QuotaExceeded(_) => Message::ArenaNotJoinable,
            Self::Competition(CompetitionError::JoinRejected { reason, .. }) => reason.clone(),
            Self::Competition(CompetitionError::AlreadyInRoster(..)) => Message::AlreadyInArena,
            Self::Competition(CompetitionError::NotInRoster(..)) => Message::NotInArena,
            other => Message::ArenaError {
                reason: other.to_string(),
            },
        }
    }
}

/// A provisioning backend failed to instantiate a template map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to provision map {map}: {reason}")]
pub struct ProvisionError {
    pub map: String,
    pub reason: String,
}

impl ProvisionError {
    pub fn new(map: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            map: map.into(),
            reason: reason.into(),
        }
    }
}
