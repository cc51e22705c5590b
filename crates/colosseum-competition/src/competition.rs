//! A live competition: one arena instance bound to one map.

use std::sync::Arc;
use std::time::Duration;

use colosseum_types::{
    ArenaId, CompetitionId, JoinResult, Message, MessageSink, PlayerId, Role,
};
use serde::Serialize;

use crate::phase::PhaseRequests;
use crate::{
    ArenaType, CompetitionError, MapDescriptor, MapInstance, MapKind, PhaseContext, PhaseId,
    PhaseManager, PhaseState, Roster, VictoryManager,
};

/// Upper bound on phase switches applied in a row from one trigger.
/// Phases that keep requesting each other are cut off here.
const MAX_CHAINED_TRANSITIONS: usize = 16;

/// A snapshot of a competition for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionInfo {
    pub id: CompetitionId,
    pub arena: String,
    pub map: String,
    pub kind: MapKind,
    pub phase: PhaseId,
    pub players: usize,
    pub spectators: usize,
    pub max_players: usize,
}

/// One live instance of an arena.
///
/// Owns its roster and its phase and victory state. Every mutation runs the
/// matching phase hook and then applies whatever the hook asked for
/// (phase switches, evictions) before returning.
pub struct Competition {
    id: CompetitionId,
    arena_id: ArenaId,
    arena: Arc<ArenaType>,
    map: MapDescriptor,
    instance: Option<MapInstance>,
    roster: Roster,
    phases: PhaseManager,
    victory: VictoryManager,
    sink: Arc<dyn MessageSink>,
    departed: Vec<PlayerId>,
    had_members: bool,
}

impl Competition {
    /// Creates the competition and enters the arena's initial phase.
    pub fn new(
        id: CompetitionId,
        arena_id: ArenaId,
        arena: Arc<ArenaType>,
        map: MapDescriptor,
        instance: Option<MapInstance>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let phases = PhaseManager::new(Arc::clone(arena.phases()));
        let victory = arena.new_victory_manager();
        let mut competition = Self {
            id,
            arena_id,
            arena,
            map,
            instance,
            roster: Roster::new(),
            phases,
            victory,
            sink,
            departed: Vec::new(),
            had_members: false,
        };
        competition.run_hook(|phases, ctx| phases.enter(ctx));
        competition
    }

    pub fn id(&self) -> CompetitionId {
        self.id
    }

    pub fn arena_id(&self) -> ArenaId {
        self.arena_id
    }

    pub fn arena(&self) -> &ArenaType {
        &self.arena
    }

    pub fn map(&self) -> &MapDescriptor {
        &self.map
    }

    pub fn instance(&self) -> Option<&MapInstance> {
        self.instance.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn phase(&self) -> PhaseId {
        self.phases.current()
    }

    pub fn phase_state(&self) -> PhaseState {
        self.phases.state()
    }

    pub fn victory(&self) -> &VictoryManager {
        &self.victory
    }

    pub fn victory_mut(&mut self) -> &mut VictoryManager {
        &mut self.victory
    }

    /// `true` when backed by a provisioned template instance.
    pub fn is_dynamic(&self) -> bool {
        self.map.kind == MapKind::Template
    }

    /// A dynamic competition whose roster emptied after it had members.
    pub fn is_abandoned(&self) -> bool {
        self.is_dynamic() && self.had_members && self.roster.is_empty()
    }

    /// Checks the join rules without touching the roster.
    pub fn evaluate_join(&self, player: PlayerId, role: Role) -> JoinResult {
        if self.roster.contains(player) {
            return JoinResult::rejected(Message::AlreadyInArena);
        }
        let config = self.arena.config();
        match role {
            Role::Playing => {
                if !self.phases.accepts(Role::Playing) {
                    return JoinResult::rejected(Message::ArenaNotJoinable);
                }
                if self.roster.playing_count() >= config.max_players {
                    return JoinResult::rejected(Message::ArenaFull);
                }
            }
            Role::Spectating => {
                if !config.allow_spectators || !self.phases.accepts(Role::Spectating) {
                    return JoinResult::rejected(Message::ArenaNotSpectatable);
                }
                if config.max_spectators > 0
                    && self.roster.spectator_count() >= config.max_spectators
                {
                    return JoinResult::rejected(Message::ArenaFull);
                }
            }
        }
        JoinResult::success()
    }

    /// Adds a player after re-checking the join rules.
    pub fn join(&mut self, player: PlayerId, role: Role) -> Result<(), CompetitionError> {
        let result = self.evaluate_join(player, role);
        if !result.is_success() {
            return Err(CompetitionError::JoinRejected {
                player,
                competition: self.id,
                reason: result.message.unwrap_or(Message::ArenaNotJoinable),
            });
        }

        self.roster.insert(player, role);
        self.had_members = true;
        tracing::info!(competition_id = %self.id, player_id = %player, %role, map = %self.map.name, "player joined");

        let map = self.map.name.clone();
        let notice = match role {
            Role::Playing => Message::ArenaJoined { map },
            Role::Spectating => Message::ArenaSpectate { map },
        };
        self.sink.send(player, notice);
        self.run_hook(|phases, ctx| phases.join(ctx, player, role));
        Ok(())
    }

    /// Removes a player and tells the active phase.
    pub fn leave(&mut self, player: PlayerId) -> Result<Role, CompetitionError> {
        let role = self
            .roster
            .remove(player)
            .ok_or(CompetitionError::NotInRoster(player, self.id))?;
        tracing::info!(competition_id = %self.id, player_id = %player, %role, "player left");
        self.sink.send(
            player,
            Message::ArenaLeft {
                map: self.map.name.clone(),
            },
        );
        self.run_hook(|phases, ctx| phases.leave(ctx, player, role));
        Ok(role)
    }

    /// Removes every member through [`Competition::leave`], so the active
    /// phase sees each departure.
    pub fn leave_all(&mut self) -> Vec<PlayerId> {
        let members = self.roster.players();
        for player in &members {
            if let Err(err) = self.leave(*player) {
                // A hook may already have evicted the rest.
                tracing::debug!(competition_id = %self.id, %err, "member already gone");
            }
        }
        members
    }

    /// Removes every member at once without running leave hooks.
    ///
    /// Evicted players are also reported by [`Competition::take_departed`].
    pub fn evict_all(&mut self) -> Vec<PlayerId> {
        self.evict_members()
    }

    pub fn update(&mut self, dt: Duration) {
        self.run_hook(|phases, ctx| phases.update(ctx, dt));
    }

    /// Switches to a declared phase from outside the phase hooks.
    pub fn set_phase(&mut self, phase: PhaseId) -> Result<(), CompetitionError> {
        let mut result = Ok(());
        let requests = self.with_context(|phases, ctx| result = phases.set_phase(phase, ctx));
        self.settle(requests);
        result
    }

    /// Asks the active phase to declare a draw. Returns `false` if the
    /// active phase is not victory-capable.
    pub fn declare_draw(&mut self) -> bool {
        let mut handled = false;
        let requests = self.with_context(|phases, ctx| handled = phases.declare_draw(ctx));
        self.settle(requests);
        handled
    }

    /// Players removed by the phases since the last call.
    pub fn take_departed(&mut self) -> Vec<PlayerId> {
        std::mem::take(&mut self.departed)
    }

    pub fn info(&self) -> CompetitionInfo {
        CompetitionInfo {
            id: self.id,
            arena: self.arena.name().to_string(),
            map: self.map.name.clone(),
            kind: self.map.kind,
            phase: self.phases.current(),
            players: self.roster.playing_count(),
            spectators: self.roster.spectator_count(),
            max_players: self.arena.config().max_players,
        }
    }

    /// Consumes the competition, handing back its provisioned instance.
    pub fn into_instance(self) -> Option<MapInstance> {
        self.instance
    }

    fn run_hook<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut PhaseManager, &mut PhaseContext<'_>),
    {
        let requests = self.with_context(hook);
        self.settle(requests);
    }

    fn with_context<F>(&mut self, hook: F) -> PhaseRequests
    where
        F: FnOnce(&mut PhaseManager, &mut PhaseContext<'_>),
    {
        let Self {
            arena,
            map,
            roster,
            phases,
            victory,
            sink,
            ..
        } = self;
        let mut ctx = PhaseContext::new(
            arena.name(),
            &map.name,
            arena.config(),
            roster,
            victory,
            &**sink,
        );
        hook(phases, &mut ctx);
        ctx.into_requests()
    }

    fn settle(&mut self, mut requests: PhaseRequests) {
        let mut transitions = 0;
        while !requests.is_empty() {
            if requests.evict {
                self.evict_members();
            }
            let Some(target) = requests.phase else {
                break;
            };
            if transitions == MAX_CHAINED_TRANSITIONS {
                tracing::error!(
                    competition_id = %self.id,
                    phase = %self.phases.current(),
                    %target,
                    "too many chained phase transitions, dropping request"
                );
                break;
            }
            transitions += 1;

            let id = self.id;
            requests = self.with_context(|phases, ctx| {
                if let Err(err) = phases.set_phase(target, ctx) {
                    tracing::error!(competition_id = %id, %err, "phase transition failed");
                }
            });
        }
    }

    fn evict_members(&mut self) -> Vec<PlayerId> {
        let evicted: Vec<PlayerId> = self.roster.drain().into_iter().map(|(p, _)| p).collect();
        for player in &evicted {
            self.sink.send(
                *player,
                Message::ArenaLeft {
                    map: self.map.name.clone(),
                },
            );
        }
        if !evicted.is_empty() {
            tracing::info!(competition_id = %self.id, count = evicted.len(), "members evicted");
        }
        self.departed.extend(evicted.iter().copied());
        evicted
    }
}

impl std::fmt::Debug for Competition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Competition")
            .field("id", &self.id)
            .field("arena", &self.arena.name())
            .field("map", &self.map.name)
            .field("phase", &self.phases.current())
            .field("roster", &self.roster)
            .finish()
    }
}
