//! Player-facing messages and the sink that delivers them.
//!
//! Colosseum does not render or translate text itself. Each [`Message`]
//! carries a stable translation key (for an external translation layer)
//! and a default English rendering via `Display`. Operator-facing
//! diagnostics never go through here; they are `tracing` events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// A message addressed to a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    NoOpenArenas,
    NoArenaWithName,
    ArenaDoesNotExist { arena: String },
    ArenaFull,
    ArenaNotJoinable,
    ArenaNotSpectatable,
    /// An unexpected failure surfaced while joining.
    ArenaError { reason: String },
    AlreadyInArena,
    NotInArena,
    NoPermission,
    ArenaJoined { map: String },
    ArenaSpectate { map: String },
    ArenaLeft { map: String },
    ArenaStartsIn { arena: String, seconds: u64 },
    ArenaStartCancelled,
    Fight,
    Victory { winners: Vec<PlayerId> },
    Draw,
}

impl Message {
    /// The translation key for this message.
    pub fn key(&self) -> &'static str {
        match self {
            Self::NoOpenArenas => "arena-no-open-arenas",
            Self::NoArenaWithName => "arena-arena-with-name",
            Self::ArenaDoesNotExist { .. } => "command-arena-does-not-exist",
            Self::ArenaFull => "arena-full",
            Self::ArenaNotJoinable => "arena-not-joinable",
            Self::ArenaNotSpectatable => "arena-not-spectatable",
            Self::ArenaError { .. } => "arena-error",
            Self::AlreadyInArena => "arena-already-in-arena",
            Self::NotInArena => "arena-not-in-arena",
            Self::NoPermission => "command-no-permission",
            Self::ArenaJoined { .. } => "arena-joined",
            Self::ArenaSpectate { .. } => "arena-spectate",
            Self::ArenaLeft { .. } => "arena-left",
            Self::ArenaStartsIn { .. } => "arena-starts-in",
            Self::ArenaStartCancelled => "arena-starts-cancelled",
            Self::Fight => "arena-fight",
            Self::Victory { .. } => "arena-victory",
            Self::Draw => "arena-draw",
        }
    }

    /// Returns `true` for messages that report a refusal or failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::NoOpenArenas
                | Self::NoArenaWithName
                | Self::ArenaDoesNotExist { .. }
                | Self::ArenaFull
                | Self::ArenaNotJoinable
                | Self::ArenaNotSpectatable
                | Self::ArenaError { .. }
                | Self::AlreadyInArena
                | Self::NotInArena
                | Self::NoPermission
                | Self::ArenaStartCancelled
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOpenArenas => write!(f, "There are no open arenas!"),
            Self::NoArenaWithName => write!(f, "There is no arena with that name!"),
            Self::ArenaDoesNotExist { arena } => {
                write!(f, "An arena by the name of {arena} does not exist!")
            }
            Self::ArenaFull => write!(f, "This arena is full!"),
            Self::ArenaNotJoinable => write!(f, "This arena is not joinable!"),
            Self::ArenaNotSpectatable => write!(f, "This arena is not able to be spectated!"),
            Self::ArenaError { reason } => {
                write!(f, "An error occurred while joining the arena: {reason}!")
            }
            Self::AlreadyInArena => write!(f, "You are already in an arena!"),
            Self::NotInArena => write!(f, "You are not in an arena!"),
            Self::NoPermission => {
                write!(f, "You do not have permission to execute this command!")
            }
            Self::ArenaJoined { map } => write!(f, "You have joined {map}!"),
            Self::ArenaSpectate { map } => write!(f, "You are now spectating {map}!"),
            Self::ArenaLeft { map } => write!(f, "You have left {map}!"),
            Self::ArenaStartsIn { arena, seconds } => {
                let unit = if *seconds == 1 { "second" } else { "seconds" };
                write!(f, "{arena} will start in {seconds} {unit}!")
            }
            Self::ArenaStartCancelled => write!(
                f,
                "Countdown cancelled as there is not enough players to start!"
            ),
            Self::Fight => write!(f, "Fight!"),
            Self::Victory { winners } => {
                let names: Vec<String> = winners.iter().map(ToString::to_string).collect();
                write!(f, "The game is over! Winners: {}", names.join(", "))
            }
            Self::Draw => write!(f, "The game ended in a draw!"),
        }
    }
}

/// Delivers player-facing messages.
///
/// Implementations forward to chat, a websocket, a translation layer, or
/// (in tests) a recording buffer. `send` is synchronous because it is
/// called from the engine's authoritative context, which must never block
/// on delivery; implementations should queue rather than wait.
pub trait MessageSink: Send + Sync + 'static {
    fn send(&self, player: PlayerId, message: Message);
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn send(&self, _player: PlayerId, _message: Message) {}
}
