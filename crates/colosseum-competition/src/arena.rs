//! Arena types: the static description of one kind of competition.

use std::sync::Arc;

use colosseum_types::Role;

use crate::phases::{Countdown, Ingame, Victory, Waiting};
use crate::victory::ConditionFactory;
use crate::{
    CompetitionConfig, CompetitionError, LastStanding, PhaseId, PhaseSet, PhaseType,
    VictoryCondition, VictoryManager,
};

/// A category of competition: its join rules, phases and victory
/// conditions. Immutable once built; shared by every competition of the
/// arena through an `Arc`.
#[derive(Clone)]
pub struct ArenaType {
    name: String,
    config: CompetitionConfig,
    phases: Arc<PhaseSet>,
    conditions: Vec<ConditionFactory>,
}

impl ArenaType {
    pub fn builder(name: impl Into<String>) -> ArenaTypeBuilder {
        ArenaTypeBuilder {
            name: name.into(),
            config: CompetitionConfig::default(),
            phases: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// The built-in lifecycle with last-player-standing victory:
    /// `waiting → countdown → ingame → victory → waiting`.
    pub fn standard(name: impl Into<String>, config: CompetitionConfig) -> Self {
        let phases = PhaseSet::from_validated(vec![
            PhaseType::new(PhaseId::WAITING, Waiting::default),
            PhaseType::new(PhaseId::COUNTDOWN, Countdown::default),
            PhaseType::new(PhaseId::INGAME, Ingame::default),
            PhaseType::victory(PhaseId::VICTORY, Victory::default),
        ]);
        let last_standing: ConditionFactory =
            Arc::new(|| Box::new(LastStanding::default()) as Box<dyn VictoryCondition>);
        Self {
            name: name.into(),
            config,
            phases: Arc::new(phases),
            conditions: vec![last_standing],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CompetitionConfig {
        &self.config
    }

    pub fn phases(&self) -> &Arc<PhaseSet> {
        &self.phases
    }

    /// The victory-capable phase, looked up by its declared capability.
    pub fn victory_phase(&self) -> Option<PhaseId> {
        self.phases.victory_phase()
    }

    /// Permission node checked before a player joins with `role`.
    pub fn permission_node(&self, role: Role) -> String {
        let action = match role {
            Role::Playing => "join",
            Role::Spectating => "spectate",
        };
        format!("colosseum.{}.{}", self.name.to_lowercase(), action)
    }

    pub(crate) fn new_victory_manager(&self) -> VictoryManager {
        VictoryManager::new(self.conditions.clone())
    }
}

impl std::fmt::Debug for ArenaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaType")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("phases", &self.phases)
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

/// Builder for arenas with custom phases or victory conditions.
pub struct ArenaTypeBuilder {
    name: String,
    config: CompetitionConfig,
    phases: Vec<PhaseType>,
    conditions: Vec<ConditionFactory>,
}

impl ArenaTypeBuilder {
    pub fn config(mut self, config: CompetitionConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a phase. The first one added is the initial phase.
    pub fn phase(mut self, phase: PhaseType) -> Self {
        self.phases.push(phase);
        self
    }

    /// Adds a victory condition. Conditions are evaluated in the order they
    /// were added; the first to decide wins.
    pub fn condition<C, F>(mut self, factory: F) -> Self
    where
        C: VictoryCondition,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.conditions
            .push(Arc::new(move || Box::new(factory()) as Box<dyn VictoryCondition>));
        self
    }

    pub fn build(self) -> Result<ArenaType, CompetitionError> {
        let phases = PhaseSet::new(&self.name, self.phases)?;
        Ok(ArenaType {
            name: self.name,
            config: self.config,
            phases: Arc::new(phases),
            conditions: self.conditions,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::TimeLimit;

    #[test]
    fn test_standard_arena_declares_victory_phase() {
        let arena = ArenaType::standard("Duel", CompetitionConfig::default());
        assert_eq!(arena.victory_phase(), Some(PhaseId::VICTORY));
        assert_eq!(arena.phases().initial().id(), PhaseId::WAITING);
        assert_eq!(
            arena.phases().ids().collect::<Vec<_>>(),
            vec![
                PhaseId::WAITING,
                PhaseId::COUNTDOWN,
                PhaseId::INGAME,
                PhaseId::VICTORY
            ]
        );
    }

    #[test]
    fn test_builder_without_victory_phase() {
        let arena = ArenaType::builder("Race")
            .phase(PhaseType::new(PhaseId::WAITING, Waiting::default))
            .phase(PhaseType::new(PhaseId::INGAME, Ingame::default))
            .condition(|| TimeLimit::new(Duration::from_secs(120)))
            .build()
            .unwrap();
        assert_eq!(arena.victory_phase(), None);
        assert_eq!(arena.name(), "Race");
    }

    #[test]
    fn test_builder_requires_phases() {
        assert!(matches!(
            ArenaType::builder("Empty").build(),
            Err(CompetitionError::NoPhases { .. })
        ));
    }

    #[test]
    fn test_permission_nodes() {
        let arena = ArenaType::standard("Duel", CompetitionConfig::default());
        assert_eq!(arena.permission_node(Role::Playing), "colosseum.duel.join");
        assert_eq!(
            arena.permission_node(Role::Spectating),
            "colosseum.duel.spectate"
        );
    }
}
