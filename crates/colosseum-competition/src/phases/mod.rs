//! Built-in phases.
//!
//! [`ArenaType::standard`](crate::ArenaType::standard) wires them up as
//! `waiting → countdown → ingame → victory → waiting`. Each one exposes
//! builder-style setters so arenas can reorder or retime them.

mod countdown;
mod ingame;
mod victory;
mod waiting;

pub use countdown::Countdown;
pub use ingame::Ingame;
pub use victory::Victory;
pub use waiting::Waiting;
