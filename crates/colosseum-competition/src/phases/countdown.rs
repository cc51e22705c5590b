use std::time::Duration;

use colosseum_types::{Message, PlayerId, Role};

use crate::{Phase, PhaseContext, PhaseId};

/// Counts down to the start of play.
///
/// Announces the remaining time on entry, then on every whole second up to
/// five and on every multiple of ten. Falls back to `previous` with a
/// cancellation notice if too few players remain.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration: Duration,
    remaining: Duration,
    last_announced: Option<u64>,
    next: PhaseId,
    previous: PhaseId,
}

impl Countdown {
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);

    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: duration,
            last_announced: None,
            next: PhaseId::INGAME,
            previous: PhaseId::WAITING,
        }
    }

    pub fn next(mut self, next: PhaseId) -> Self {
        self.next = next;
        self
    }

    pub fn previous(mut self, previous: PhaseId) -> Self {
        self.previous = previous;
        self
    }

    fn seconds_left(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    fn announce(&mut self, ctx: &PhaseContext<'_>, seconds: u64) {
        self.last_announced = Some(seconds);
        ctx.broadcast(Message::ArenaStartsIn {
            arena: ctx.arena_name().to_string(),
            seconds,
        });
    }

    /// Returns `true` if the countdown was cancelled.
    fn cancel_if_short(&self, ctx: &mut PhaseContext<'_>) -> bool {
        if ctx.roster().playing_count() >= ctx.config().min_players {
            return false;
        }
        ctx.broadcast(Message::ArenaStartCancelled);
        ctx.set_phase(self.previous);
        true
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DURATION)
    }
}

impl Phase for Countdown {
    fn on_enter(&mut self, ctx: &mut PhaseContext<'_>) {
        self.remaining = self.duration;
        let seconds = self.seconds_left();
        self.announce(ctx, seconds);
    }

    fn on_update(&mut self, ctx: &mut PhaseContext<'_>, dt: Duration) {
        if self.cancel_if_short(ctx) {
            return;
        }

        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            ctx.broadcast(Message::Fight);
            ctx.set_phase(self.next);
            return;
        }

        let seconds = self.seconds_left();
        let due = seconds <= 5 || seconds % 10 == 0;
        if due && self.last_announced != Some(seconds) {
            self.announce(ctx, seconds);
        }
    }

    fn on_leave(&mut self, ctx: &mut PhaseContext<'_>, _player: PlayerId, role: Role) {
        if role == Role::Playing {
            self.cancel_if_short(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_left_rounds_up() {
        let mut countdown = Countdown::new(Duration::from_secs(10));
        assert_eq!(countdown.seconds_left(), 10);
        countdown.remaining = Duration::from_millis(4_200);
        assert_eq!(countdown.seconds_left(), 5);
        countdown.remaining = Duration::from_millis(5_000);
        assert_eq!(countdown.seconds_left(), 5);
    }
}
