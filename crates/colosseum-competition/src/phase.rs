//! The per-competition phase state machine.
//!
//! An arena declares an ordered [`PhaseSet`]. Each competition runs a
//! [`PhaseManager`] over that set: exactly one phase instance is active at
//! a time, and switching phases always runs the old instance's exit hook
//! before the new instance's enter hook. Phase instances are created fresh
//! on every switch, so they can keep per-visit state in plain fields.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use colosseum_types::{Message, MessageSink, PlayerId, Role};
use serde::Serialize;
use tokio::time::Instant;

use crate::{CompetitionConfig, CompetitionError, Outcome, Roster, VictoryManager};

/// Name of a declared phase, unique within an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhaseId(pub &'static str);

impl PhaseId {
    pub const WAITING: PhaseId = PhaseId("waiting");
    pub const COUNTDOWN: PhaseId = PhaseId("countdown");
    pub const INGAME: PhaseId = PhaseId("ingame");
    pub const VICTORY: PhaseId = PhaseId("victory");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One state of a competition.
///
/// Every hook has a no-op default, so a phase only overrides what it cares
/// about. Hooks never switch phases directly: they ask through
/// [`PhaseContext::set_phase`] and the competition applies the request once
/// the hook returns.
pub trait Phase: Send + 'static {
    /// Called right after this instance becomes the active phase.
    fn on_enter(&mut self, _ctx: &mut PhaseContext<'_>) {}

    /// Called right before this instance stops being the active phase.
    fn on_exit(&mut self, _ctx: &mut PhaseContext<'_>) {}

    /// Called on every update tick with the time since the previous one.
    fn on_update(&mut self, _ctx: &mut PhaseContext<'_>, _dt: Duration) {}

    /// Called after a player was added to the roster.
    fn on_join(&mut self, _ctx: &mut PhaseContext<'_>, _player: PlayerId, _role: Role) {}

    /// Called after a player was removed from the roster.
    fn on_leave(&mut self, _ctx: &mut PhaseContext<'_>, _player: PlayerId, _role: Role) {}

    /// Whether new members with `role` may join while this phase is active.
    fn accepts(&self, _role: Role) -> bool {
        true
    }
}

/// A phase that can conclude a round.
///
/// At most one per arena, registered with [`PhaseType::victory`]. The
/// shutdown path forces competitions into it and asks for a draw.
pub trait VictoryPhase: Phase {
    fn on_victory(&mut self, ctx: &mut PhaseContext<'_>, winners: &[PlayerId]);

    fn on_draw(&mut self, ctx: &mut PhaseContext<'_>);
}

type StandardFactory = Arc<dyn Fn() -> Box<dyn Phase> + Send + Sync>;
type VictoryFactory = Arc<dyn Fn() -> Box<dyn VictoryPhase> + Send + Sync>;

#[derive(Clone)]
enum PhaseFactory {
    Standard(StandardFactory),
    Victory(VictoryFactory),
}

/// A declared phase: its id plus a factory for fresh instances.
///
/// The victory capability is part of the declaration, so it can be looked
/// up without instantiating anything.
#[derive(Clone)]
pub struct PhaseType {
    id: PhaseId,
    factory: PhaseFactory,
}

impl PhaseType {
    pub fn new<P, F>(id: PhaseId, factory: F) -> Self
    where
        P: Phase,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self {
            id,
            factory: PhaseFactory::Standard(Arc::new(move || Box::new(factory()) as Box<dyn Phase>)),
        }
    }

    /// Declares the victory-capable phase of an arena.
    pub fn victory<P, F>(id: PhaseId, factory: F) -> Self
    where
        P: VictoryPhase,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self {
            id,
            factory: PhaseFactory::Victory(Arc::new(move || {
                Box::new(factory()) as Box<dyn VictoryPhase>
            })),
        }
    }

    pub fn id(&self) -> PhaseId {
        self.id
    }

    pub fn is_victory(&self) -> bool {
        matches!(self.factory, PhaseFactory::Victory(_))
    }

    fn instantiate(&self) -> ActivePhase {
        match &self.factory {
            PhaseFactory::Standard(f) => ActivePhase::Standard(f()),
            PhaseFactory::Victory(f) => ActivePhase::Victory(f()),
        }
    }
}

impl fmt::Debug for PhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseType")
            .field("id", &self.id)
            .field("victory", &self.is_victory())
            .finish()
    }
}

/// The ordered phases of one arena. The first one is the initial phase.
#[derive(Debug, Clone)]
pub struct PhaseSet {
    types: Vec<PhaseType>,
}

impl PhaseSet {
    pub fn new(arena: &str, types: Vec<PhaseType>) -> Result<Self, CompetitionError> {
        if types.is_empty() {
            return Err(CompetitionError::NoPhases {
                arena: arena.to_string(),
            });
        }
        for (i, phase) in types.iter().enumerate() {
            if types[..i].iter().any(|earlier| earlier.id == phase.id) {
                return Err(CompetitionError::DuplicatePhase {
                    arena: arena.to_string(),
                    phase: phase.id,
                });
            }
        }
        if types.iter().filter(|t| t.is_victory()).count() > 1 {
            return Err(CompetitionError::MultipleVictoryPhases {
                arena: arena.to_string(),
            });
        }
        Ok(Self { types })
    }

    /// For phase lists that are known to be valid.
    pub(crate) fn from_validated(types: Vec<PhaseType>) -> Self {
        debug_assert!(!types.is_empty());
        Self { types }
    }

    pub fn initial(&self) -> &PhaseType {
        // `new` guarantees at least one declared phase.
        &self.types[0]
    }

    pub fn get(&self, id: PhaseId) -> Option<&PhaseType> {
        self.types.iter().find(|t| t.id == id)
    }

    /// The id of the victory-capable phase, if one is declared.
    pub fn victory_phase(&self) -> Option<PhaseId> {
        self.types.iter().find(|t| t.is_victory()).map(|t| t.id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PhaseId> + '_ {
        self.types.iter().map(|t| t.id)
    }
}

/// What a phase hook can see and ask for.
///
/// Borrowed from the competition for the duration of one hook call.
pub struct PhaseContext<'a> {
    arena: &'a str,
    map: &'a str,
    config: &'a CompetitionConfig,
    roster: &'a Roster,
    victory: &'a mut VictoryManager,
    sink: &'a dyn MessageSink,
    requested: Option<PhaseId>,
    evict: bool,
}

impl<'a> PhaseContext<'a> {
    pub(crate) fn new(
        arena: &'a str,
        map: &'a str,
        config: &'a CompetitionConfig,
        roster: &'a Roster,
        victory: &'a mut VictoryManager,
        sink: &'a dyn MessageSink,
    ) -> Self {
        Self {
            arena,
            map,
            config,
            roster,
            victory,
            sink,
            requested: None,
            evict: false,
        }
    }

    pub fn arena_name(&self) -> &str {
        self.arena
    }

    pub fn map_name(&self) -> &str {
        self.map
    }

    pub fn config(&self) -> &CompetitionConfig {
        self.config
    }

    pub fn roster(&self) -> &Roster {
        self.roster
    }

    pub fn victory(&mut self) -> &mut VictoryManager {
        self.victory
    }

    /// Runs the victory conditions against the current roster.
    pub fn update_victory(&mut self, dt: Duration) -> Option<Outcome> {
        self.victory.update(self.roster, dt)
    }

    /// Asks for a switch to `phase` once the current hook returns.
    pub fn set_phase(&mut self, phase: PhaseId) {
        if let Some(previous) = self.requested.replace(phase) {
            tracing::debug!(arena = %self.arena, %previous, %phase, "phase request replaced");
        }
    }

    /// Asks for every member to be removed once the current hook returns.
    pub fn evict_all(&mut self) {
        self.evict = true;
    }

    pub fn send(&self, player: PlayerId, message: Message) {
        self.sink.send(player, message);
    }

    /// Sends `message` to every member, players and spectators alike.
    pub fn broadcast(&self, message: Message) {
        for player in self.roster.players() {
            self.sink.send(player, message.clone());
        }
    }

    pub(crate) fn into_requests(self) -> PhaseRequests {
        PhaseRequests {
            phase: self.requested,
            evict: self.evict,
        }
    }
}

/// Requests collected from one hook call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PhaseRequests {
    pub phase: Option<PhaseId>,
    pub evict: bool,
}

impl PhaseRequests {
    pub fn is_empty(&self) -> bool {
        self.phase.is_none() && !self.evict
    }
}

/// Which phase is active and since when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseState {
    pub current: PhaseId,
    pub started_at: Instant,
}

impl PhaseState {
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

enum ActivePhase {
    Standard(Box<dyn Phase>),
    Victory(Box<dyn VictoryPhase>),
}

macro_rules! with_active {
    ($active:expr, $phase:ident => $body:expr) => {
        match $active {
            ActivePhase::Standard($phase) => $body,
            ActivePhase::Victory($phase) => $body,
        }
    };
}

/// Drives one competition through its arena's phases.
pub struct PhaseManager {
    phases: Arc<PhaseSet>,
    active: ActivePhase,
    state: PhaseState,
}

impl PhaseManager {
    /// Instantiates the initial phase. Its enter hook is run separately by
    /// [`PhaseManager::enter`], once the owner can build a context.
    pub fn new(phases: Arc<PhaseSet>) -> Self {
        let initial = phases.initial();
        let active = initial.instantiate();
        let state = PhaseState {
            current: initial.id,
            started_at: Instant::now(),
        };
        Self {
            phases,
            active,
            state,
        }
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn current(&self) -> PhaseId {
        self.state.current
    }

    pub fn phases(&self) -> &PhaseSet {
        &self.phases
    }

    /// `true` while the victory-capable phase is active.
    pub fn is_victory(&self) -> bool {
        matches!(self.active, ActivePhase::Victory(_))
    }

    /// Exits the active phase and enters a fresh instance of `id`.
    ///
    /// Switching to the phase that is already active is allowed and
    /// restarts it.
    pub fn set_phase(
        &mut self,
        id: PhaseId,
        ctx: &mut PhaseContext<'_>,
    ) -> Result<(), CompetitionError> {
        let next = self
            .phases
            .get(id)
            .ok_or_else(|| CompetitionError::UnknownPhase {
                arena: ctx.arena_name().to_string(),
                phase: id,
            })?
            .instantiate();

        let from = self.state.current;
        with_active!(&mut self.active, phase => phase.on_exit(ctx));
        self.active = next;
        self.state = PhaseState {
            current: id,
            started_at: Instant::now(),
        };
        tracing::debug!(arena = %ctx.arena_name(), map = %ctx.map_name(), %from, to = %id, "phase changed");
        with_active!(&mut self.active, phase => phase.on_enter(ctx));
        Ok(())
    }

    pub fn enter(&mut self, ctx: &mut PhaseContext<'_>) {
        with_active!(&mut self.active, phase => phase.on_enter(ctx));
    }

    pub fn update(&mut self, ctx: &mut PhaseContext<'_>, dt: Duration) {
        with_active!(&mut self.active, phase => phase.on_update(ctx, dt));
    }

    pub fn join(&mut self, ctx: &mut PhaseContext<'_>, player: PlayerId, role: Role) {
        with_active!(&mut self.active, phase => phase.on_join(ctx, player, role));
    }

    pub fn leave(&mut self, ctx: &mut PhaseContext<'_>, player: PlayerId, role: Role) {
        with_active!(&mut self.active, phase => phase.on_leave(ctx, player, role));
    }

    pub fn accepts(&self, role: Role) -> bool {
        with_active!(&self.active, phase => phase.accepts(role))
    }

    /// Forwards a draw to the active phase. Returns `false` when the active
    /// phase is not victory-capable.
    pub fn declare_draw(&mut self, ctx: &mut PhaseContext<'_>) -> bool {
        match &mut self.active {
            ActivePhase::Victory(phase) => {
                phase.on_draw(ctx);
                true
            }
            ActivePhase::Standard(_) => false,
        }
    }

    pub fn declare_victory(&mut self, ctx: &mut PhaseContext<'_>, winners: &[PlayerId]) -> bool {
        match &mut self.active {
            ActivePhase::Victory(phase) => {
                phase.on_victory(ctx, winners);
                true
            }
            ActivePhase::Standard(_) => false,
        }
    }
}

impl fmt::Debug for PhaseManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseManager")
            .field("state", &self.state)
            .field("victory", &self.is_victory())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use colosseum_types::NullSink;

    use super::*;

    #[derive(Default)]
    struct Plain;
    impl Phase for Plain {}

    #[derive(Default)]
    struct Ending;
    impl Phase for Ending {}
    impl VictoryPhase for Ending {
        fn on_victory(&mut self, _ctx: &mut PhaseContext<'_>, _winners: &[PlayerId]) {}
        fn on_draw(&mut self, ctx: &mut PhaseContext<'_>) {
            ctx.victory().declare_draw();
        }
    }

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Phase for Recording {
        fn on_enter(&mut self, _ctx: &mut PhaseContext<'_>) {
            self.log.lock().unwrap().push(format!("enter {}", self.name));
        }
        fn on_exit(&mut self, _ctx: &mut PhaseContext<'_>) {
            self.log.lock().unwrap().push(format!("exit {}", self.name));
        }
    }

    fn recording(id: PhaseId, log: &Arc<Mutex<Vec<String>>>) -> PhaseType {
        let log = Arc::clone(log);
        PhaseType::new(id, move || Recording {
            name: id.as_str(),
            log: Arc::clone(&log),
        })
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert!(matches!(
            PhaseSet::new("duel", vec![]),
            Err(CompetitionError::NoPhases { .. })
        ));
    }

    #[test]
    fn test_duplicate_phase_is_rejected() {
        let set = PhaseSet::new(
            "duel",
            vec![
                PhaseType::new(PhaseId::WAITING, || Plain),
                PhaseType::new(PhaseId::WAITING, || Plain),
            ],
        );
        assert!(matches!(set, Err(CompetitionError::DuplicatePhase { .. })));
    }

    #[test]
    fn test_two_victory_phases_are_rejected() {
        let set = PhaseSet::new(
            "duel",
            vec![
                PhaseType::victory(PhaseId::VICTORY, || Ending),
                PhaseType::victory(PhaseId("finale"), || Ending),
            ],
        );
        assert!(matches!(
            set,
            Err(CompetitionError::MultipleVictoryPhases { .. })
        ));
    }

    #[test]
    fn test_victory_capability_is_declared() {
        let set = PhaseSet::new(
            "duel",
            vec![
                PhaseType::new(PhaseId::WAITING, || Plain),
                PhaseType::victory(PhaseId::VICTORY, || Ending),
            ],
        )
        .unwrap();
        assert_eq!(set.initial().id(), PhaseId::WAITING);
        assert_eq!(set.victory_phase(), Some(PhaseId::VICTORY));
        assert!(set.get(PhaseId::VICTORY).unwrap().is_victory());
    }

    #[tokio::test]
    async fn test_set_phase_exits_then_enters() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = PhaseSet::new(
            "duel",
            vec![
                recording(PhaseId::WAITING, &log),
                recording(PhaseId::INGAME, &log),
            ],
        )
        .unwrap();

        let config = CompetitionConfig::default();
        let roster = Roster::new();
        let mut victory = VictoryManager::new(Vec::new());
        let mut ctx = PhaseContext::new("duel", "pit", &config, &roster, &mut victory, &NullSink);

        let mut manager = PhaseManager::new(Arc::new(set));
        manager.enter(&mut ctx);
        manager.set_phase(PhaseId::INGAME, &mut ctx).unwrap();

        assert_eq!(manager.current(), PhaseId::INGAME);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["enter waiting", "exit waiting", "enter ingame"]
        );
    }

    #[tokio::test]
    async fn test_unknown_phase_is_an_error() {
        let set = PhaseSet::new("duel", vec![PhaseType::new(PhaseId::WAITING, || Plain)]).unwrap();
        let config = CompetitionConfig::default();
        let roster = Roster::new();
        let mut victory = VictoryManager::new(Vec::new());
        let mut ctx = PhaseContext::new("duel", "pit", &config, &roster, &mut victory, &NullSink);

        let mut manager = PhaseManager::new(Arc::new(set));
        let err = manager.set_phase(PhaseId("lobby"), &mut ctx).unwrap_err();
        assert!(matches!(err, CompetitionError::UnknownPhase { .. }));
        assert_eq!(manager.current(), PhaseId::WAITING);
    }

    #[tokio::test]
    async fn test_draw_only_reaches_victory_phase() {
        let set = PhaseSet::new(
            "duel",
            vec![
                PhaseType::new(PhaseId::WAITING, || Plain),
                PhaseType::victory(PhaseId::VICTORY, || Ending),
            ],
        )
        .unwrap();
        let config = CompetitionConfig::default();
        let roster = Roster::new();
        let mut victory = VictoryManager::new(Vec::new());
        let mut manager = PhaseManager::new(Arc::new(set));

        {
            let mut ctx =
                PhaseContext::new("duel", "pit", &config, &roster, &mut victory, &NullSink);
            assert!(!manager.declare_draw(&mut ctx));
            manager.set_phase(PhaseId::VICTORY, &mut ctx).unwrap();
            assert!(manager.is_victory());
            assert!(manager.declare_draw(&mut ctx));
        }
        assert_eq!(victory.outcome(), Some(&Outcome::Draw));
    }
}
