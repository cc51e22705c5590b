//! Engine actor: the single task that owns the registry.
//!
//! Every registry mutation, roster change and phase transition happens
//! here, one command at a time. Work that may suspend (permission checks,
//! provisioning) stays with the caller; only its result is sent back in.

use std::sync::Arc;

use colosseum_competition::{ArenaType, CompetitionInfo, MapDescriptor, MapInstance, PhaseId};
use colosseum_tick::UpdateClock;
use colosseum_types::{ArenaId, CompetitionId, JoinResult, PlayerId, Role};
use tokio::sync::{mpsc, oneshot};

use crate::engine::ArenaLookup;
use crate::{
    ArenaEngine, EngineError, ProvisioningBackend, Reservation, ShutdownCoordinator,
    ShutdownReport,
};

type Reply<T> = oneshot::Sender<T>;

/// Commands sent to the engine actor through its channel.
pub(crate) enum EngineCommand {
    RegisterArena {
        arena: ArenaType,
        maps: Vec<MapDescriptor>,
        reply: Reply<Result<ArenaId, EngineError>>,
    },
    AddMap {
        arena: String,
        map: MapDescriptor,
        reply: Reply<Result<Option<CompetitionId>, EngineError>>,
    },
    RemoveMap {
        arena: String,
        map: String,
        reply: Reply<Result<usize, EngineError>>,
    },
    Lookup {
        arena: String,
        player: PlayerId,
        map: Option<String>,
        reply: Reply<Result<ArenaLookup, EngineError>>,
    },
    Candidates {
        arena: ArenaId,
        map: Option<String>,
        reply: Reply<Vec<CompetitionId>>,
    },
    /// Business-rule half of `can_join`; also returns the permission node
    /// the caller must check.
    EvaluateJoin {
        competition: CompetitionId,
        player: PlayerId,
        role: Role,
        reply: Reply<(JoinResult, Option<String>)>,
    },
    Reserve {
        arena: ArenaId,
        map: Option<String>,
        reply: Reply<Result<(Reservation, Vec<MapDescriptor>), EngineError>>,
    },
    Commit {
        reservation: Reservation,
        map: String,
        instance: MapInstance,
        reply: Reply<Result<CompetitionId, EngineError>>,
    },
    Join {
        competition: CompetitionId,
        player: PlayerId,
        role: Role,
        reply: Reply<Result<(), EngineError>>,
    },
    Leave {
        player: PlayerId,
        reply: Reply<Result<CompetitionId, EngineError>>,
    },
    List {
        arena: String,
        map: Option<String>,
        reply: Reply<Result<Vec<CompetitionInfo>, EngineError>>,
    },
    Info {
        competition: CompetitionId,
        reply: Reply<Option<CompetitionInfo>>,
    },
    SetPhase {
        competition: CompetitionId,
        phase: PhaseId,
        reply: Reply<Result<(), EngineError>>,
    },
    PlayerCompetition {
        player: PlayerId,
        reply: Reply<Option<CompetitionId>>,
    },
    Shutdown {
        reply: Reply<ShutdownReport>,
    },
}

/// The actor state. Runs inside a Tokio task.
pub(crate) struct EngineActor<B: ProvisioningBackend> {
    engine: ArenaEngine,
    backend: Arc<B>,
    clock: UpdateClock,
    receiver: mpsc::Receiver<EngineCommand>,
}

impl<B: ProvisioningBackend> EngineActor<B> {
    pub(crate) fn new(
        engine: ArenaEngine,
        backend: Arc<B>,
        clock: UpdateClock,
        receiver: mpsc::Receiver<EngineCommand>,
    ) -> Self {
        Self {
            engine,
            backend,
            clock,
            receiver,
        }
    }

    /// Processes commands and update ticks until shutdown.
    pub(crate) async fn run(mut self) {
        tracing::info!(rate_hz = self.clock.rate_hz(), "engine actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::info!("all engine handles dropped, shutting down");
                        self.shutdown();
                        break;
                    };
                    if let EngineCommand::Shutdown { reply } = cmd {
                        let _ = reply.send(self.shutdown());
                        break;
                    }
                    self.handle(cmd);
                }
                tick = self.clock.next_tick() => {
                    self.engine.update(tick.dt);
                    let abandoned = self.engine.sweep_abandoned();
                    self.release(abandoned);
                    self.clock.finish_tick();
                }
            }
        }

        tracing::info!("engine actor stopped");
    }

    fn handle(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::RegisterArena { arena, maps, reply } => {
                let _ = reply.send(self.engine.register_arena(arena, maps));
            }
            EngineCommand::AddMap { arena, map, reply } => {
                let result = self
                    .engine
                    .resolve(&arena)
                    .and_then(|id| self.engine.add_map(id, map));
                let _ = reply.send(result);
            }
            EngineCommand::RemoveMap { arena, map, reply } => {
                let result = self
                    .engine
                    .resolve(&arena)
                    .and_then(|id| self.engine.remove_map(id, &map));
                let result = result.map(|removed| {
                    let count = removed.len();
                    let instances = removed
                        .into_iter()
                        .filter_map(|c| c.into_instance())
                        .collect();
                    self.release(instances);
                    count
                });
                let _ = reply.send(result);
            }
            EngineCommand::Lookup {
                arena,
                player,
                map,
                reply,
            } => {
                let _ = reply.send(self.engine.lookup(&arena, player, map.as_deref()));
            }
            EngineCommand::Candidates { arena, map, reply } => {
                let _ = reply.send(self.engine.competitions_on(arena, map.as_deref()));
            }
            EngineCommand::EvaluateJoin {
                competition,
                player,
                role,
                reply,
            } => {
                let result = self.engine.evaluate_join(competition, player, role);
                let node = self
                    .engine
                    .competition(competition)
                    .map(|c| c.arena().permission_node(role));
                let _ = reply.send((result, node));
            }
            EngineCommand::Reserve { arena, map, reply } => {
                let result = self.engine.reserve(arena).map(|reservation| {
                    let templates = self.engine.eligible_templates(arena, map.as_deref());
                    (reservation, templates)
                });
                let _ = reply.send(result);
            }
            EngineCommand::Commit {
                reservation,
                map,
                instance,
                reply,
            } => {
                let result = self.engine.commit(reservation, &map, instance.clone());
                if let Err(err) = &result {
                    tracing::error!(%map, error = %err, "could not register provisioned competition");
                    self.release(vec![instance]);
                }
                let _ = reply.send(result);
            }
            EngineCommand::Join {
                competition,
                player,
                role,
                reply,
            } => {
                let _ = reply.send(self.engine.join(competition, player, role));
            }
            EngineCommand::Leave { player, reply } => {
                let result = self.engine.leave(player);
                let abandoned = self.engine.sweep_abandoned();
                self.release(abandoned);
                let _ = reply.send(result);
            }
            EngineCommand::List { arena, map, reply } => {
                let result = self.engine.resolve(&arena).map(|id| match &map {
                    Some(name) => self.engine.find_by_name(id, name),
                    None => self.engine.list_live(id),
                });
                let _ = reply.send(result);
            }
            EngineCommand::Info { competition, reply } => {
                let _ = reply.send(self.engine.competition(competition).map(|c| c.info()));
            }
            EngineCommand::SetPhase {
                competition,
                phase,
                reply,
            } => {
                let result = self.engine.set_phase(competition, phase);
                let abandoned = self.engine.sweep_abandoned();
                self.release(abandoned);
                let _ = reply.send(result);
            }
            EngineCommand::PlayerCompetition { player, reply } => {
                let _ = reply.send(self.engine.player_competition(player));
            }
            EngineCommand::Shutdown { reply } => {
                let _ = reply.send(self.shutdown());
            }
        }
    }

    fn shutdown(&mut self) -> ShutdownReport {
        tracing::info!(competitions = self.engine.live_count(), "engine shutting down");
        let (report, instances) = ShutdownCoordinator::run(&mut self.engine);
        self.release(instances);
        report
    }

    /// Hands instances back to the backend without blocking the actor.
    fn release(&self, instances: Vec<MapInstance>) {
        for instance in instances {
            let backend = Arc::clone(&self.backend);
            tokio::spawn(async move {
                tracing::debug!(instance = instance.id, map = %instance.map, "releasing instance");
                backend.release(instance).await;
            });
        }
    }
}
