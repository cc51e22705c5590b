//! Orderly shutdown of every live competition.

use colosseum_competition::{MapInstance, Outcome, PhaseId};
use colosseum_types::{CompetitionId, PlayerId};
use serde::Serialize;

use crate::ArenaEngine;

/// How one competition was wound down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcludedCompetition {
    pub id: CompetitionId,
    pub arena: String,
    pub map: String,
    /// Phase the competition was in when it was removed.
    pub phase: PhaseId,
    pub outcome: Option<Outcome>,
    /// `true` if it went through its victory phase; `false` if its members
    /// were simply made to leave.
    pub graceful: bool,
    pub victory_released: bool,
    /// Members removed during shutdown.
    pub removed: Vec<PlayerId>,
}

/// Everything the shutdown coordinator did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub competitions: Vec<ConcludedCompetition>,
}

impl ShutdownReport {
    pub fn len(&self) -> usize {
        self.competitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitions.is_empty()
    }

    pub fn get(&self, id: CompetitionId) -> Option<&ConcludedCompetition> {
        self.competitions.iter().find(|c| c.id == id)
    }
}

/// Drains the registry when the engine stops.
///
/// Competitions whose arena declares a victory phase are forced into it,
/// concluded with a draw and have their victory manager released before
/// the remaining members are evicted. Competitions of other arenas have
/// every member leave normally. Either way the competition is then removed
/// and its provisioned instance, if any, is handed back.
pub struct ShutdownCoordinator;

impl ShutdownCoordinator {
    pub fn run(engine: &mut ArenaEngine) -> (ShutdownReport, Vec<MapInstance>) {
        // Snapshot ids first; everything below mutates the registry.
        let snapshot: Vec<(Option<PhaseId>, Vec<CompetitionId>)> = engine
            .arena_ids()
            .into_iter()
            .map(|arena| {
                let victory = engine.arena(arena).and_then(|a| a.victory_phase());
                (victory, engine.competitions_on(arena, None))
            })
            .collect();

        let mut report = ShutdownReport::default();
        let mut instances = Vec::new();
        for (victory, ids) in snapshot {
            for id in ids {
                let Some(concluded) = Self::conclude(engine, id, victory) else {
                    continue;
                };
                match engine.remove_competition(id) {
                    Ok(competition) => instances.extend(competition.into_instance()),
                    Err(err) => {
                        tracing::error!(competition_id = %id, error = %err, "failed to remove competition")
                    }
                }
                report.competitions.push(concluded);
            }
        }

        tracing::info!(
            competitions = report.len(),
            instances = instances.len(),
            "shutdown complete"
        );
        (report, instances)
    }

    fn conclude(
        engine: &mut ArenaEngine,
        id: CompetitionId,
        victory: Option<PhaseId>,
    ) -> Option<ConcludedCompetition> {
        let competition = engine.competition_mut(id)?;

        let removed = match victory {
            Some(phase) => {
                if let Err(err) = competition.set_phase(phase) {
                    tracing::error!(competition_id = %id, error = %err, "could not enter victory phase");
                }
                if !competition.declare_draw() {
                    competition.victory_mut().declare_draw();
                }
                competition.victory_mut().end();
                let mut removed = competition.take_departed();
                removed.extend(competition.evict_all());
                removed
            }
            None => competition.leave_all(),
        };
        competition.take_departed();

        tracing::debug!(competition_id = %id, graceful = victory.is_some(), "competition concluded");
        Some(ConcludedCompetition {
            id,
            arena: competition.arena().name().to_string(),
            map: competition.map().name.clone(),
            phase: competition.phase(),
            outcome: competition.victory().outcome().cloned(),
            graceful: victory.is_some(),
            victory_released: competition.victory().is_released(),
            removed,
        })
    }
}
