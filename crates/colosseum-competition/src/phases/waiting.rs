use colosseum_types::{PlayerId, Role};

use crate::{Phase, PhaseContext, PhaseId};

/// Gathers players until `min_players` are playing.
#[derive(Debug, Clone)]
pub struct Waiting {
    next: PhaseId,
}

impl Waiting {
    pub fn new() -> Self {
        Self {
            next: PhaseId::COUNTDOWN,
        }
    }

    pub fn next(mut self, next: PhaseId) -> Self {
        self.next = next;
        self
    }

    fn check_ready(&self, ctx: &mut PhaseContext<'_>) {
        if ctx.roster().playing_count() >= ctx.config().min_players {
            ctx.set_phase(self.next);
        }
    }
}

impl Default for Waiting {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase for Waiting {
    fn on_enter(&mut self, ctx: &mut PhaseContext<'_>) {
        ctx.victory().reset();
        self.check_ready(ctx);
    }

    fn on_join(&mut self, ctx: &mut PhaseContext<'_>, _player: PlayerId, role: Role) {
        if role == Role::Playing {
            self.check_ready(ctx);
        }
    }
}
