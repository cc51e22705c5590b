//! Competition lifecycle for Colosseum.
//!
//! A [`Competition`] is one live instance of an arena, bound to exactly one
//! [`MapDescriptor`]. It owns its [`Roster`], a [`PhaseManager`] driving it
//! through the arena's declared phases, and a [`VictoryManager`] that
//! resolves the outcome of each round.
//!
//! Nothing here is asynchronous or thread-safe: every method is called from
//! the engine's authoritative context, one at a time.
//!
//! # Key types
//!
//! - [`ArenaType`]: a category of activity: phases, rules, victory conditions
//! - [`Phase`] / [`VictoryPhase`]: the traits arena authors implement
//! - [`PhaseType`]: a declared phase, tagged with its victory capability
//! - [`Competition`]: roster, phase and victory state of one instance

mod arena;
mod competition;
mod config;
mod error;
mod map;
mod phase;
pub mod phases;
mod roster;
mod victory;

pub use arena::{ArenaType, ArenaTypeBuilder};
pub use competition::{Competition, CompetitionInfo};
pub use config::CompetitionConfig;
pub use error::CompetitionError;
pub use map::{Bounds, MapDescriptor, MapInstance, MapKind};
pub use phase::{
    Phase, PhaseContext, PhaseId, PhaseManager, PhaseSet, PhaseState, PhaseType, VictoryPhase,
};
pub use roster::Roster;
pub use victory::{LastStanding, Outcome, TimeLimit, VictoryCondition, VictoryManager};
