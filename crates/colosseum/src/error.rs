//! Unified error type for Colosseum.

use colosseum_competition::CompetitionError;
use colosseum_engine::EngineError;

/// Top-level error wrapping every crate-specific error.
///
/// The `#[from]` variants let `?` convert sub-crate errors directly.
/// Provisioning failures never reach it: the engine logs them and tries
/// the next template.
#[derive(Debug, thiserror::Error)]
pub enum ColosseumError {
    /// Arena, phase or roster rules were violated.
    #[error(transparent)]
    Competition(#[from] CompetitionError),

    /// Registry, configuration or actor failure.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
