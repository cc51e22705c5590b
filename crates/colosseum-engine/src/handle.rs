//! The public face of the engine.

use std::sync::Arc;

use colosseum_competition::{ArenaType, CompetitionInfo, MapDescriptor, PhaseId};
use colosseum_tick::UpdateClock;
use colosseum_types::{ArenaId, CompetitionId, JoinResult, Message, MessageSink, PlayerId, Role};
use rand::seq::SliceRandom;
use tokio::sync::{mpsc, oneshot};

use crate::actor::{EngineActor, EngineCommand};
use crate::engine::ArenaLookup;
use crate::{
    ArenaEngine, EngineConfig, EngineError, PermissionChecker, ProvisioningBackend,
    ShutdownReport,
};

/// Handle to a running engine actor.
///
/// Cheap to clone: an `mpsc::Sender` plus shared collaborators. Every
/// method can be called from any task; registry work is forwarded to the
/// actor, while permission checks and provisioning run in the caller's
/// task.
pub struct EngineHandle<P: PermissionChecker, B: ProvisioningBackend> {
    sender: mpsc::Sender<EngineCommand>,
    permissions: Arc<P>,
    backend: Arc<B>,
    sink: Arc<dyn MessageSink>,
}

impl<P: PermissionChecker, B: ProvisioningBackend> Clone for EngineHandle<P, B> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            permissions: Arc::clone(&self.permissions),
            backend: Arc::clone(&self.backend),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<P: PermissionChecker, B: ProvisioningBackend> EngineHandle<P, B> {
    /// Spawns the engine actor and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        config: EngineConfig,
        permissions: P,
        backend: B,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_size.max(1));
        let clock = UpdateClock::with_rate(config.tick_rate_hz);
        let backend = Arc::new(backend);
        let engine = ArenaEngine::new(config, Arc::clone(&sink));

        tokio::spawn(EngineActor::new(engine, Arc::clone(&backend), clock, rx).run());

        Self {
            sender: tx,
            permissions: Arc::new(permissions),
            backend,
            sink,
        }
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    pub async fn register_arena(
        &self,
        arena: ArenaType,
        maps: Vec<MapDescriptor>,
    ) -> Result<ArenaId, EngineError> {
        self.call(|reply| EngineCommand::RegisterArena { arena, maps, reply })
            .await
    }

    /// Adds a map at runtime. Returns the competition created for a fixed map.
    pub async fn add_map(
        &self,
        arena: &str,
        map: MapDescriptor,
    ) -> Result<Option<CompetitionId>, EngineError> {
        let arena = arena.to_string();
        self.call(|reply| EngineCommand::AddMap { arena, map, reply })
            .await
    }

    /// Removes a map and the competitions bound to it. Returns how many
    /// competitions were removed.
    pub async fn remove_map(&self, arena: &str, map: &str) -> Result<usize, EngineError> {
        let arena = arena.to_string();
        let map = map.to_string();
        self.call(|reply| EngineCommand::RemoveMap { arena, map, reply })
            .await
    }

    /// Live competitions of an arena in creation order.
    pub async fn list_live_competitions(
        &self,
        arena: &str,
    ) -> Result<Vec<CompetitionInfo>, EngineError> {
        let arena = arena.to_string();
        self.call(|reply| EngineCommand::List {
            arena,
            map: None,
            reply,
        })
        .await
    }

    /// Live competitions of an arena running on the map named `map`.
    pub async fn find_by_name(
        &self,
        arena: &str,
        map: &str,
    ) -> Result<Vec<CompetitionInfo>, EngineError> {
        let arena = arena.to_string();
        let map = Some(map.to_string());
        self.call(|reply| EngineCommand::List { arena, map, reply })
            .await
    }

    pub async fn competition_info(
        &self,
        competition: CompetitionId,
    ) -> Result<Option<CompetitionInfo>, EngineError> {
        self.request(|reply| EngineCommand::Info { competition, reply })
            .await
    }

    pub async fn set_phase(
        &self,
        competition: CompetitionId,
        phase: PhaseId,
    ) -> Result<(), EngineError> {
        self.call(|reply| EngineCommand::SetPhase {
            competition,
            phase,
            reply,
        })
        .await
    }

    pub async fn player_competition(
        &self,
        player: PlayerId,
    ) -> Result<Option<CompetitionId>, EngineError> {
        self.request(|reply| EngineCommand::PlayerCompetition { player, reply })
            .await
    }

    // -----------------------------------------------------------------------
    // Arbitration
    // -----------------------------------------------------------------------

    /// Whether `player` may join `competition` with `role`.
    ///
    /// Checks the join rules on the actor, then the permission node here.
    pub async fn can_join(
        &self,
        competition: CompetitionId,
        player: PlayerId,
        role: Role,
    ) -> JoinResult {
        let (result, node) = match self
            .request(|reply| EngineCommand::EvaluateJoin {
                competition,
                player,
                role,
                reply,
            })
            .await
        {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(competition_id = %competition, player_id = %player, error = %err, "join check failed");
                return JoinResult::rejected(err.user_message());
            }
        };
        if !result.is_success() {
            return result;
        }
        let Some(node) = node else {
            return JoinResult::rejected(Message::ArenaNotJoinable);
        };
        if !self.permissions.check(player, &node).await {
            tracing::debug!(player_id = %player, %node, "permission denied");
            return JoinResult::rejected(Message::NoPermission);
        }
        result
    }

    /// The first candidate, in order, that accepts the player.
    ///
    /// Candidates are checked one at a time; the next check only starts
    /// once the previous one has answered.
    pub async fn find_joinable_competition(
        &self,
        candidates: &[CompetitionId],
        player: PlayerId,
        role: Role,
    ) -> Option<CompetitionId> {
        for &candidate in candidates {
            if self.can_join(candidate, player, role).await.is_success() {
                return Some(candidate);
            }
        }
        None
    }

    /// Finds a competition that accepts the player, provisioning a new one
    /// from a template map if none does.
    ///
    /// Returns `None` when nothing accepts the player and nothing can be
    /// created; the reason is logged.
    pub async fn get_or_create_competition(
        &self,
        arena: &str,
        player: PlayerId,
        role: Role,
        map: Option<&str>,
    ) -> Option<CompetitionId> {
        let lookup = match self.lookup(arena, player, map).await {
            Ok(lookup) => lookup,
            Err(err) => {
                tracing::warn!(%arena, error = %err, "cannot arbitrate");
                return None;
            }
        };
        self.arbitrate(&lookup, player, role, map).await
    }

    async fn arbitrate(
        &self,
        lookup: &ArenaLookup,
        player: PlayerId,
        role: Role,
        map: Option<&str>,
    ) -> Option<CompetitionId> {
        let (arena, arena_name) = (lookup.arena, lookup.name.as_str());
        let map_filter = map.map(str::to_string);
        let candidates = match self
            .request(|reply| EngineCommand::Candidates {
                arena,
                map: map_filter,
                reply,
            })
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::error!(arena = %arena_name, error = %err, "could not list competitions");
                return None;
            }
        };
        if let Some(found) = self.find_joinable_competition(&candidates, player, role).await {
            return Some(found);
        }

        // Only provision for a requester who could take the new competition.
        if let Some(current) = lookup.current {
            tracing::debug!(arena = %arena_name, player_id = %player, competition_id = %current, "player already in a competition, not creating a dynamic one");
            return None;
        }
        let node = lookup.permission_node(role);
        if !self.permissions.check(player, node).await {
            tracing::debug!(arena = %arena_name, player_id = %player, %node, "permission denied, not creating a dynamic competition");
            return None;
        }

        if !self.backend.is_available() {
            tracing::error!(arena = %arena_name, "no provisioning backend available, not creating a dynamic competition");
            return None;
        }

        let map_filter = map.map(str::to_string);
        let (reservation, mut templates) = match self
            .call(|reply| EngineCommand::Reserve {
                arena,
                map: map_filter,
                reply,
            })
            .await
        {
            Ok(reserved) => reserved,
            Err(EngineError::QuotaExceeded(_)) => {
                tracing::warn!(arena = %arena_name, "dynamic instance limit reached, not creating a dynamic competition");
                return None;
            }
            Err(err) => {
                tracing::error!(arena = %arena_name, error = %err, "could not reserve a dynamic instance");
                return None;
            }
        };

        if templates.is_empty() {
            tracing::warn!(arena = %arena_name, map = ?map, "no template map to create a dynamic competition from");
            return None;
        }
        if map.is_none() {
            templates.shuffle(&mut rand::rng());
        }

        for template in templates {
            let instance = match self.backend.instantiate(arena_name, &template).await {
                Ok(instance) => instance,
                Err(err) => {
                    tracing::warn!(arena = %arena_name, map = %template.name, error = %err, "failed to create dynamic competition");
                    continue;
                }
            };
            tracing::info!(arena = %arena_name, map = %template.name, instance = instance.id, "dynamic competition provisioned");

            let retained = instance.clone();
            let map = template.name;
            return match self
                .call(|reply| EngineCommand::Commit {
                    reservation,
                    map,
                    instance,
                    reply,
                })
                .await
            {
                Ok(id) => Some(id),
                Err(EngineError::Unavailable) => {
                    tracing::error!(arena = %arena_name, "engine stopped before the competition was registered");
                    self.backend.release(retained).await;
                    None
                }
                // The actor already logged and released the instance.
                Err(_) => None,
            };
        }
        None
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Joins `player` to a competition of `arena` as a player, optionally on
    /// a specific map. Rejections are also sent to the player.
    pub async fn join(&self, player: PlayerId, arena: &str, map: Option<&str>) -> JoinResult {
        let lookup = match self.lookup(arena, player, map).await {
            Ok(lookup) => lookup,
            Err(err) => return self.reject(player, err.user_message()),
        };
        if lookup.current.is_some() {
            return self.reject(player, Message::AlreadyInArena);
        }
        if !lookup.map_known {
            return self.reject(player, Message::NoArenaWithName);
        }
        if !lookup.has_maps {
            return self.reject(player, Message::NoOpenArenas);
        }

        match self
            .arbitrate(&lookup, player, Role::Playing, map)
            .await
        {
            Some(competition) => self.enter(competition, player, Role::Playing).await,
            None => self.reject(player, Message::ArenaNotJoinable),
        }
    }

    /// Joins `player` as a spectator of the first live competition of
    /// `arena` (on `map`, if given).
    pub async fn spectate(&self, player: PlayerId, arena: &str, map: Option<&str>) -> JoinResult {
        let lookup = match self.lookup(arena, player, map).await {
            Ok(lookup) => lookup,
            Err(err) => return self.reject(player, err.user_message()),
        };
        if lookup.current.is_some() {
            return self.reject(player, Message::AlreadyInArena);
        }

        let map_filter = map.map(str::to_string);
        let candidates = self
            .request(|reply| EngineCommand::Candidates {
                arena: lookup.arena,
                map: map_filter,
                reply,
            })
            .await;
        let candidates = match candidates {
            Ok(candidates) => candidates,
            Err(err) => return self.reject(player, err.user_message()),
        };
        let Some(&first) = candidates.first() else {
            let message = if map.is_some() {
                Message::NoArenaWithName
            } else {
                Message::NoOpenArenas
            };
            return self.reject(player, message);
        };

        let result = self.can_join(first, player, Role::Spectating).await;
        if !result.is_success() {
            let reason = result.message.unwrap_or(Message::ArenaNotSpectatable);
            return self.reject(player, reason);
        }
        self.enter(first, player, Role::Spectating).await
    }

    /// Removes `player` from their competition. Returns `false` (and tells
    /// the player) if they were not in one.
    pub async fn leave(&self, player: PlayerId) -> bool {
        match self
            .call(|reply| EngineCommand::Leave { player, reply })
            .await
        {
            Ok(_) => true,
            Err(err) => {
                self.sink.send(player, err.user_message());
                false
            }
        }
    }

    /// Concludes every live competition and stops the actor.
    ///
    /// Returns the report on the first call; `None` once the engine has
    /// already stopped.
    pub async fn shutdown(&self) -> Option<ShutdownReport> {
        self.request(|reply| EngineCommand::Shutdown { reply })
            .await
            .ok()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn lookup(
        &self,
        arena: &str,
        player: PlayerId,
        map: Option<&str>,
    ) -> Result<ArenaLookup, EngineError> {
        let arena = arena.to_string();
        let map = map.map(str::to_string);
        self.call(|reply| EngineCommand::Lookup {
            arena,
            player,
            map,
            reply,
        })
        .await
    }

    async fn enter(&self, competition: CompetitionId, player: PlayerId, role: Role) -> JoinResult {
        match self
            .call(|reply| EngineCommand::Join {
                competition,
                player,
                role,
                reply,
            })
            .await
        {
            Ok(()) => JoinResult::success(),
            Err(err) => {
                tracing::debug!(competition_id = %competition, player_id = %player, error = %err, "join failed after check");
                self.reject(player, err.user_message())
            }
        }
    }

    fn reject(&self, player: PlayerId, message: Message) -> JoinResult {
        self.sink.send(player, message.clone());
        JoinResult::rejected(message)
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| EngineError::Unavailable)?;
        reply_rx.await.map_err(|_| EngineError::Unavailable)
    }

    /// [`Self::request`] for commands whose reply is itself a `Result`.
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        self.request(command).await?
    }
}
