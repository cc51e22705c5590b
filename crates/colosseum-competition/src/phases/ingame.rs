use std::time::Duration;

use colosseum_types::{PlayerId, Role};

use crate::{Phase, PhaseContext, PhaseId};

/// Play in progress. Evaluates the arena's victory conditions every update.
#[derive(Debug, Clone)]
pub struct Ingame {
    next: PhaseId,
    late_join: bool,
}

impl Ingame {
    pub fn new() -> Self {
        Self {
            next: PhaseId::VICTORY,
            late_join: false,
        }
    }

    pub fn next(mut self, next: PhaseId) -> Self {
        self.next = next;
        self
    }

    /// Lets players (not only spectators) join a round in progress.
    pub fn late_join(mut self, allow: bool) -> Self {
        self.late_join = allow;
        self
    }

    fn evaluate(&self, ctx: &mut PhaseContext<'_>, dt: Duration) {
        if let Some(outcome) = ctx.update_victory(dt) {
            tracing::debug!(arena = %ctx.arena_name(), map = %ctx.map_name(), ?outcome, "round decided");
            ctx.set_phase(self.next);
        }
    }
}

impl Default for Ingame {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase for Ingame {
    fn on_enter(&mut self, ctx: &mut PhaseContext<'_>) {
        ctx.victory().arm();
    }

    fn on_update(&mut self, ctx: &mut PhaseContext<'_>, dt: Duration) {
        self.evaluate(ctx, dt);
    }

    fn on_leave(&mut self, ctx: &mut PhaseContext<'_>, _player: PlayerId, role: Role) {
        if role == Role::Playing {
            self.evaluate(ctx, Duration::ZERO);
        }
    }

    fn accepts(&self, role: Role) -> bool {
        match role {
            Role::Playing => self.late_join,
            Role::Spectating => true,
        }
    }
}
