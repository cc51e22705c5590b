//! The arena registry.
//!
//! [`ArenaEngine`] holds every registered arena, its map descriptors, its
//! live competitions and the player → competition index. It is plain
//! synchronous state: the engine actor owns the only instance and applies
//! one operation at a time, which is what keeps the invariants below.
//!
//! - a player is in at most one competition's roster;
//! - every live competition's map is in its arena's descriptor set;
//! - live template-backed competitions plus outstanding reservations never
//!   exceed the arena's quota.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use colosseum_competition::{
    ArenaType, Competition, CompetitionInfo, MapDescriptor, MapInstance, PhaseId,
};
use colosseum_types::{ArenaId, CompetitionId, JoinResult, Message, MessageSink, PlayerId, Role};

use crate::config::Quota;
use crate::reservation::ReservationCounter;
use crate::{EngineConfig, EngineError, Reservation};

struct ArenaEntry {
    arena: Arc<ArenaType>,
    maps: Vec<MapDescriptor>,
    /// Live competitions in creation order.
    competitions: Vec<CompetitionId>,
    quota: Quota,
    reservations: ReservationCounter,
}

/// What the entry points need to know before arbitration starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArenaLookup {
    pub arena: ArenaId,
    /// Registered spelling of the arena name.
    pub name: String,
    pub current: Option<CompetitionId>,
    pub has_maps: bool,
    pub map_known: bool,
    /// Permission nodes by role, playing first.
    pub nodes: [String; 2],
}

impl ArenaLookup {
    pub fn permission_node(&self, role: Role) -> &str {
        match role {
            Role::Playing => &self.nodes[0],
            Role::Spectating => &self.nodes[1],
        }
    }
}

/// Registry of arenas, maps and live competitions.
pub struct ArenaEngine {
    config: EngineConfig,
    sink: Arc<dyn MessageSink>,
    arenas: HashMap<ArenaId, ArenaEntry>,
    /// Registration order, for stable iteration.
    arena_order: Vec<ArenaId>,
    /// Lowercased arena name → id.
    names: HashMap<String, ArenaId>,
    competitions: HashMap<CompetitionId, Competition>,
    players: HashMap<PlayerId, CompetitionId>,
    next_arena_id: u64,
    next_competition_id: u64,
}

impl ArenaEngine {
    pub fn new(config: EngineConfig, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            config,
            sink,
            arenas: HashMap::new(),
            arena_order: Vec::new(),
            names: HashMap::new(),
            competitions: HashMap::new(),
            players: HashMap::new(),
            next_arena_id: 1,
            next_competition_id: 1,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Arenas and maps
    // -----------------------------------------------------------------------

    /// Registers an arena with its maps and creates one competition per
    /// fixed map.
    ///
    /// Invalid or duplicate maps are logged and skipped; they do not stop
    /// the arena or its other maps from loading.
    pub fn register_arena(
        &mut self,
        arena: ArenaType,
        maps: Vec<MapDescriptor>,
    ) -> Result<ArenaId, EngineError> {
        let key = arena.name().to_lowercase();
        if self.names.contains_key(&key) {
            return Err(EngineError::DuplicateArena(arena.name().to_string()));
        }

        let id = ArenaId(self.next_arena_id);
        self.next_arena_id += 1;
        let quota = self.config.quota_for(arena.name());
        let name = arena.name().to_string();

        self.arenas.insert(
            id,
            ArenaEntry {
                arena: Arc::new(arena),
                maps: Vec::new(),
                competitions: Vec::new(),
                quota,
                reservations: ReservationCounter::default(),
            },
        );
        self.arena_order.push(id);
        self.names.insert(key, id);
        tracing::info!(arena = %name, arena_id = %id, %quota, "arena registered");

        for map in maps {
            let map_name = map.name.clone();
            if let Err(err) = self.add_map(id, map) {
                tracing::error!(arena = %name, map = %map_name, error = %err, "skipping map");
            }
        }
        Ok(id)
    }

    /// Resolves an arena name, ignoring case.
    pub fn arena_id(&self, name: &str) -> Option<ArenaId> {
        self.names.get(&name.to_lowercase()).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<ArenaId, EngineError> {
        self.arena_id(name)
            .ok_or_else(|| EngineError::UnknownArena(name.to_string()))
    }

    pub fn arena(&self, id: ArenaId) -> Option<&Arc<ArenaType>> {
        self.arenas.get(&id).map(|entry| &entry.arena)
    }

    /// Registered arenas in registration order.
    pub fn arena_ids(&self) -> Vec<ArenaId> {
        self.arena_order.clone()
    }

    pub fn maps(&self, arena: ArenaId) -> &[MapDescriptor] {
        self.arenas
            .get(&arena)
            .map(|entry| entry.maps.as_slice())
            .unwrap_or_default()
    }

    /// Adds a map at runtime. A fixed map gets its competition right away.
    pub fn add_map(
        &mut self,
        arena: ArenaId,
        map: MapDescriptor,
    ) -> Result<Option<CompetitionId>, EngineError> {
        map.validate()?;
        let entry = self.entry_mut(arena)?;
        if entry.maps.iter().any(|m| m.name == map.name) {
            return Err(EngineError::DuplicateMap {
                arena: entry.arena.name().to_string(),
                map: map.name,
            });
        }

        let is_template = map.is_template();
        let name = map.name.clone();
        tracing::info!(arena = %entry.arena.name(), map = %name, kind = ?map.kind, "map loaded");
        entry.maps.push(map);

        if is_template {
            return Ok(None);
        }
        self.add_competition(arena, &name, None).map(Some)
    }

    /// Removes a map and every competition bound to it. Members are
    /// evicted with a "left" notice.
    pub fn remove_map(
        &mut self,
        arena: ArenaId,
        name: &str,
    ) -> Result<Vec<Competition>, EngineError> {
        let entry = self.entry_mut(arena)?;
        let index = entry
            .maps
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| EngineError::UnknownMap {
                arena: entry.arena.name().to_string(),
                map: name.to_string(),
            })?;
        entry.maps.remove(index);
        let arena_name = entry.arena.name().to_string();

        let bound = self.competitions_on(arena, Some(name));
        let mut removed = Vec::with_capacity(bound.len());
        for id in bound {
            removed.push(self.remove_competition(id)?);
        }
        tracing::info!(arena = %arena_name, map = %name, removed = removed.len(), "map removed");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Competitions
    // -----------------------------------------------------------------------

    /// Creates and registers a competition on one of the arena's maps.
    pub fn add_competition(
        &mut self,
        arena: ArenaId,
        map: &str,
        instance: Option<MapInstance>,
    ) -> Result<CompetitionId, EngineError> {
        let entry = self.entry(arena)?;
        let arena_type = Arc::clone(&entry.arena);
        let descriptor = entry
            .maps
            .iter()
            .find(|m| m.name == map)
            .cloned()
            .ok_or_else(|| EngineError::UnknownMap {
                arena: arena_type.name().to_string(),
                map: map.to_string(),
            })?;

        if !descriptor.is_template() {
            if let Some(existing) = self.competitions_on(arena, Some(map)).first() {
                return Err(EngineError::MapInUse {
                    map: map.to_string(),
                    competition: *existing,
                });
            }
        }

        let id = CompetitionId(self.next_competition_id);
        self.next_competition_id += 1;
        tracing::info!(competition_id = %id, arena = %arena_type.name(), %map, "competition created");
        let competition = Competition::new(
            id,
            arena,
            arena_type,
            descriptor,
            instance,
            Arc::clone(&self.sink),
        );

        self.competitions.insert(id, competition);
        self.entry_mut(arena)?.competitions.push(id);
        Ok(id)
    }

    /// Unregisters a competition, evicting anyone still in it.
    pub fn remove_competition(&mut self, id: CompetitionId) -> Result<Competition, EngineError> {
        let mut competition = self
            .competitions
            .remove(&id)
            .ok_or(EngineError::CompetitionNotFound(id))?;
        if let Some(entry) = self.arenas.get_mut(&competition.arena_id()) {
            entry.competitions.retain(|c| *c != id);
        }

        competition.evict_all();
        competition.take_departed();
        self.players.retain(|_, c| *c != id);
        tracing::info!(competition_id = %id, map = %competition.map().name, "competition removed");
        Ok(competition)
    }

    pub fn competition(&self, id: CompetitionId) -> Option<&Competition> {
        self.competitions.get(&id)
    }

    pub(crate) fn competition_mut(&mut self, id: CompetitionId) -> Option<&mut Competition> {
        self.competitions.get_mut(&id)
    }

    /// Live competitions of an arena in creation order, optionally only
    /// those on the map named `map`.
    pub fn competitions_on(&self, arena: ArenaId, map: Option<&str>) -> Vec<CompetitionId> {
        let Some(entry) = self.arenas.get(&arena) else {
            return Vec::new();
        };
        entry
            .competitions
            .iter()
            .filter(|id| match (map, self.competitions.get(id)) {
                (None, Some(_)) => true,
                (Some(name), Some(c)) => c.map().name == name,
                (_, None) => false,
            })
            .copied()
            .collect()
    }

    pub fn list_live(&self, arena: ArenaId) -> Vec<CompetitionInfo> {
        self.infos(self.competitions_on(arena, None))
    }

    pub fn find_by_name(&self, arena: ArenaId, map: &str) -> Vec<CompetitionInfo> {
        self.infos(self.competitions_on(arena, Some(map)))
    }

    pub fn live_count(&self) -> usize {
        self.competitions.len()
    }

    /// Live template-backed competitions of an arena.
    pub fn live_dynamic(&self, arena: ArenaId) -> usize {
        self.competitions_on(arena, None)
            .iter()
            .filter_map(|id| self.competitions.get(id))
            .filter(|c| c.is_dynamic())
            .count()
    }

    // -----------------------------------------------------------------------
    // Quota
    // -----------------------------------------------------------------------

    /// Takes a quota slot for a competition that is about to be provisioned.
    pub fn reserve(&mut self, arena: ArenaId) -> Result<Reservation, EngineError> {
        let live = self.live_dynamic(arena);
        let entry = self.entry(arena)?;
        let outstanding = entry.reservations.outstanding();
        if entry.quota.is_met(live + outstanding) {
            return Err(EngineError::QuotaExceeded(arena));
        }
        Ok(entry.reservations.take(arena))
    }

    /// Outstanding reservations of an arena.
    pub fn reserved(&self, arena: ArenaId) -> usize {
        self.arenas
            .get(&arena)
            .map(|entry| entry.reservations.outstanding())
            .unwrap_or(0)
    }

    /// Template maps a new competition could be provisioned from.
    pub fn eligible_templates(&self, arena: ArenaId, map: Option<&str>) -> Vec<MapDescriptor> {
        self.maps(arena)
            .iter()
            .filter(|m| m.is_template())
            .filter(|m| map.is_none_or(|name| m.name == name))
            .cloned()
            .collect()
    }

    /// Registers a provisioned competition and gives its reservation back.
    pub fn commit(
        &mut self,
        reservation: Reservation,
        map: &str,
        instance: MapInstance,
    ) -> Result<CompetitionId, EngineError> {
        let id = self.add_competition(reservation.arena(), map, Some(instance))?;
        drop(reservation);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Rosters
    // -----------------------------------------------------------------------

    /// Business-rule half of `can_join`. A competition that disappeared
    /// counts as a rejection.
    pub fn evaluate_join(&self, id: CompetitionId, player: PlayerId, role: Role) -> JoinResult {
        if self.players.contains_key(&player) {
            return JoinResult::rejected(Message::AlreadyInArena);
        }
        match self.competitions.get(&id) {
            Some(competition) => competition.evaluate_join(player, role),
            None => JoinResult::rejected(Message::ArenaNotJoinable),
        }
    }

    pub fn join(
        &mut self,
        id: CompetitionId,
        player: PlayerId,
        role: Role,
    ) -> Result<(), EngineError> {
        if let Some(current) = self.players.get(&player) {
            return Err(EngineError::AlreadyInArena(player, *current));
        }
        let competition = self
            .competitions
            .get_mut(&id)
            .ok_or(EngineError::CompetitionNotFound(id))?;
        competition.join(player, role)?;
        self.players.insert(player, id);
        self.sync_departed(id);
        Ok(())
    }

    pub fn leave(&mut self, player: PlayerId) -> Result<CompetitionId, EngineError> {
        let id = self
            .players
            .get(&player)
            .copied()
            .ok_or(EngineError::NotInArena(player))?;
        let Some(competition) = self.competitions.get_mut(&id) else {
            tracing::error!(player_id = %player, competition_id = %id, "player indexed in a missing competition");
            self.players.remove(&player);
            return Err(EngineError::CompetitionNotFound(id));
        };
        competition.leave(player)?;
        self.players.remove(&player);
        self.sync_departed(id);
        Ok(id)
    }

    pub fn player_competition(&self, player: PlayerId) -> Option<CompetitionId> {
        self.players.get(&player).copied()
    }

    pub fn set_phase(&mut self, id: CompetitionId, phase: PhaseId) -> Result<(), EngineError> {
        let competition = self
            .competitions
            .get_mut(&id)
            .ok_or(EngineError::CompetitionNotFound(id))?;
        competition.set_phase(phase)?;
        self.sync_departed(id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    /// Advances every live competition by `dt`.
    pub fn update(&mut self, dt: Duration) {
        let ids: Vec<CompetitionId> = self
            .arena_order
            .iter()
            .filter_map(|arena| self.arenas.get(arena))
            .flat_map(|entry| entry.competitions.iter().copied())
            .collect();
        for id in ids {
            if let Some(competition) = self.competitions.get_mut(&id) {
                competition.update(dt);
            }
            self.sync_departed(id);
        }
    }

    /// Removes template-backed competitions that emptied after having had
    /// members and returns their instances for release.
    pub fn sweep_abandoned(&mut self) -> Vec<MapInstance> {
        let abandoned: Vec<CompetitionId> = self
            .competitions
            .iter()
            .filter(|(_, c)| c.is_abandoned())
            .map(|(id, _)| *id)
            .collect();

        let mut instances = Vec::new();
        for id in abandoned {
            match self.remove_competition(id) {
                Ok(competition) => {
                    tracing::info!(competition_id = %id, "dynamic competition abandoned");
                    instances.extend(competition.into_instance());
                }
                Err(err) => tracing::error!(competition_id = %id, error = %err, "sweep failed"),
            }
        }
        instances
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    pub(crate) fn lookup(
        &self,
        arena: &str,
        player: PlayerId,
        map: Option<&str>,
    ) -> Result<ArenaLookup, EngineError> {
        let id = self.resolve(arena)?;
        let maps = self.maps(id);
        let arena_type = self.arena(id).ok_or_else(|| EngineError::UnknownArena(arena.to_string()))?;
        Ok(ArenaLookup {
            arena: id,
            name: arena_type.name().to_string(),
            current: self.player_competition(player),
            has_maps: !maps.is_empty(),
            map_known: map.is_none_or(|name| maps.iter().any(|m| m.name == name)),
            nodes: [
                arena_type.permission_node(Role::Playing),
                arena_type.permission_node(Role::Spectating),
            ],
        })
    }

    fn infos(&self, ids: Vec<CompetitionId>) -> Vec<CompetitionInfo> {
        ids.iter()
            .filter_map(|id| self.competitions.get(id))
            .map(Competition::info)
            .collect()
    }

    /// Drops index entries for players the phases removed on their own.
    fn sync_departed(&mut self, id: CompetitionId) {
        let Some(competition) = self.competitions.get_mut(&id) else {
            return;
        };
        for player in competition.take_departed() {
            if self.players.get(&player) == Some(&id) {
                self.players.remove(&player);
            }
        }
    }

    fn entry(&self, arena: ArenaId) -> Result<&ArenaEntry, EngineError> {
        self.arenas
            .get(&arena)
            .ok_or_else(|| EngineError::UnknownArena(arena.to_string()))
    }

    fn entry_mut(&mut self, arena: ArenaId) -> Result<&mut ArenaEntry, EngineError> {
        self.arenas
            .get_mut(&arena)
            .ok_or_else(|| EngineError::UnknownArena(arena.to_string()))
    }
}

impl std::fmt::Debug for ArenaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaEngine")
            .field("arenas", &self.arenas.len())
            .field("competitions", &self.competitions.len())
            .field("players", &self.players.len())
            .finish()
    }
}
