use std::time::Duration;

use colosseum_types::{Message, PlayerId, Role};

use crate::{Outcome, Phase, PhaseContext, PhaseId, VictoryPhase};

/// Announces the outcome, lingers for `duration`, then clears the roster
/// and starts over.
#[derive(Debug, Clone)]
pub struct Victory {
    duration: Duration,
    elapsed: Duration,
    next: PhaseId,
}

impl Victory {
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(5);

    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            next: PhaseId::WAITING,
        }
    }

    pub fn next(mut self, next: PhaseId) -> Self {
        self.next = next;
        self
    }

    fn announce(ctx: &PhaseContext<'_>, outcome: &Outcome) {
        match outcome {
            Outcome::Victory(winners) => ctx.broadcast(Message::Victory {
                winners: winners.clone(),
            }),
            Outcome::Draw => ctx.broadcast(Message::Draw),
        }
    }
}

impl Default for Victory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DURATION)
    }
}

impl Phase for Victory {
    fn on_enter(&mut self, ctx: &mut PhaseContext<'_>) {
        self.elapsed = Duration::ZERO;
        if let Some(outcome) = ctx.victory().outcome().cloned() {
            Self::announce(ctx, &outcome);
        }
    }

    fn on_exit(&mut self, ctx: &mut PhaseContext<'_>) {
        ctx.victory().end();
    }

    fn on_update(&mut self, ctx: &mut PhaseContext<'_>, dt: Duration) {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            ctx.evict_all();
            ctx.set_phase(self.next);
        }
    }

    fn accepts(&self, _role: Role) -> bool {
        false
    }
}

impl VictoryPhase for Victory {
    fn on_victory(&mut self, ctx: &mut PhaseContext<'_>, winners: &[PlayerId]) {
        ctx.victory().declare_victory(winners.to_vec());
        Self::announce(ctx, &Outcome::Victory(winners.to_vec()));
    }

    fn on_draw(&mut self, ctx: &mut PhaseContext<'_>) {
        ctx.victory().declare_draw();
        Self::announce(ctx, &Outcome::Draw);
    }
}
