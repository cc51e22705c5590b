//! Shared vocabulary for Colosseum.
//!
//! Every other crate in the workspace speaks in terms of these types:
//!
//! - **Identity** ([`PlayerId`], [`ArenaId`], [`CompetitionId`]): stable
//!   ids used as registry keys instead of object identity.
//! - **Membership** ([`Role`], [`JoinResult`]): how a player takes part in
//!   a competition and whether they were allowed in.
//! - **Messages** ([`Message`], [`MessageSink`]): the player-facing text
//!   produced by every resolved outcome.
//!
//! # Architecture
//!
//! ```text
//! Engine (arbitration, registry) → Competition (roster, phases) → Types (this crate)
//! ```

mod ids;
mod join;
mod message;

pub use ids::{ArenaId, CompetitionId, PlayerId};
pub use join::{JoinOutcome, JoinResult, Role};
pub use message::{Message, MessageSink, NullSink};
