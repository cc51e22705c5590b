//! Victory resolution.
//!
//! A [`VictoryManager`] lives for as long as its competition. Each round
//! it is armed when play starts, evaluates the arena's victory conditions
//! on every update, and is ended (released) when the victory phase is left
//! or the engine shuts down. `reset` prepares it for the next round.

use std::sync::Arc;
use std::time::Duration;

use colosseum_types::PlayerId;
use serde::{Deserialize, Serialize};

use crate::Roster;

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory(Vec<PlayerId>),
    Draw,
}

/// A rule that decides when a round is over.
///
/// Conditions are instance-scoped: a fresh set is built from the arena's
/// factories every time the manager is armed, and dropped when it ends.
pub trait VictoryCondition: Send + 'static {
    /// Called on every update while the round is running.
    fn update(&mut self, roster: &Roster, dt: Duration) -> Option<Outcome>;
}

pub(crate) type ConditionFactory = Arc<dyn Fn() -> Box<dyn VictoryCondition> + Send + Sync>;

/// The round is won once at most `remaining` players are still playing.
#[derive(Debug, Clone)]
pub struct LastStanding {
    remaining: usize,
}

impl LastStanding {
    pub fn new(remaining: usize) -> Self {
        Self { remaining }
    }
}

impl Default for LastStanding {
    fn default() -> Self {
        Self::new(1)
    }
}

impl VictoryCondition for LastStanding {
    fn update(&mut self, roster: &Roster, _dt: Duration) -> Option<Outcome> {
        let playing = roster.playing();
        if playing.is_empty() {
            return Some(Outcome::Draw);
        }
        if playing.len() <= self.remaining {
            return Some(Outcome::Victory(playing));
        }
        None
    }
}

/// The round ends in a draw once `limit` of play time has passed.
#[derive(Debug, Clone)]
pub struct TimeLimit {
    limit: Duration,
    elapsed: Duration,
}

impl TimeLimit {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            elapsed: Duration::ZERO,
        }
    }
}

impl VictoryCondition for TimeLimit {
    fn update(&mut self, _roster: &Roster, dt: Duration) -> Option<Outcome> {
        self.elapsed += dt;
        (self.elapsed >= self.limit).then_some(Outcome::Draw)
    }
}

/// Owns the victory conditions and outcome of one competition.
pub struct VictoryManager {
    factories: Vec<ConditionFactory>,
    conditions: Vec<Box<dyn VictoryCondition>>,
    armed: bool,
    outcome: Option<Outcome>,
    released: bool,
}

impl VictoryManager {
    pub(crate) fn new(factories: Vec<ConditionFactory>) -> Self {
        Self {
            factories,
            conditions: Vec::new(),
            armed: false,
            outcome: None,
            released: false,
        }
    }

    /// Builds a fresh set of conditions and starts evaluating them.
    pub fn arm(&mut self) {
        if self.released {
            tracing::warn!("arming a released victory manager without reset");
            return;
        }
        self.conditions = self.factories.iter().map(|f| f()).collect();
        self.armed = true;
    }

    /// Evaluates the conditions in declaration order.
    ///
    /// Returns the outcome only on the update that decides it; afterwards
    /// the manager is disarmed until the next round.
    pub fn update(&mut self, roster: &Roster, dt: Duration) -> Option<Outcome> {
        if !self.armed || self.outcome.is_some() {
            return None;
        }
        let decided = self
            .conditions
            .iter_mut()
            .find_map(|condition| condition.update(roster, dt))?;
        self.armed = false;
        self.outcome = Some(decided.clone());
        Some(decided)
    }

    pub fn declare_draw(&mut self) {
        self.armed = false;
        self.outcome = Some(Outcome::Draw);
    }

    pub fn declare_victory(&mut self, winners: Vec<PlayerId>) {
        self.armed = false;
        self.outcome = Some(Outcome::Victory(winners));
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Releases the instance-scoped conditions.
    ///
    /// Does not decide anything. Returns `true` only for the call that
    /// actually released, so a round is released exactly once no matter
    /// how many paths try.
    pub fn end(&mut self) -> bool {
        if self.released {
            tracing::debug!("victory manager already released");
            return false;
        }
        self.conditions.clear();
        self.armed = false;
        self.released = true;
        true
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Clears the outcome and release flag for a new round.
    pub fn reset(&mut self) {
        self.conditions.clear();
        self.armed = false;
        self.outcome = None;
        self.released = false;
    }
}

impl std::fmt::Debug for VictoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VictoryManager")
            .field("conditions", &self.conditions.len())
            .field("armed", &self.armed)
            .field("outcome", &self.outcome)
            .field("released", &self.released)
            .finish()
    }
}
