//! # Colosseum
//!
//! Competition lifecycle and matchmaking engine for arena games.
//!
//! Arena authors describe a category of activity with an [`ArenaType`]:
//! its phases, its victory conditions and its join rules. The engine keeps
//! live competitions of every arena on their maps, places players who ask
//! to join, provisions new competitions from template maps under a quota,
//! and drains everything in order on shutdown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use colosseum::prelude::*;
//!
//! # async fn run() -> Result<(), ColosseumError> {
//! colosseum::init_tracing();
//! let colosseum = Colosseum::builder()
//!     .arena(ArenaType::standard("Duel", CompetitionConfig::default()))
//!     .descriptors(StaticDescriptors::new().with("Duel", vec![MapDescriptor::fixed("pit")]))
//!     .start()
//!     .await?;
//! let report = colosseum.run_until(async { /* wait for a stop signal */ }).await;
//! # Ok(())
//! # }
//! ```
//!
//! [`ArenaType`]: colosseum_competition::ArenaType

mod builder;
mod error;

pub use builder::{Colosseum, ColosseumBuilder};
pub use error::ColosseumError;

pub use colosseum_competition as competition;
pub use colosseum_engine as engine;
pub use colosseum_types as types;

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that honours `RUST_LOG`, defaulting to
/// `info`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::{Colosseum, ColosseumBuilder, ColosseumError};

    pub use colosseum_competition::phases::{Countdown, Ingame, Victory, Waiting};
    pub use colosseum_competition::{
        ArenaType, Bounds, CompetitionConfig, CompetitionInfo, LastStanding, MapDescriptor,
        MapInstance, MapKind, Outcome, Phase, PhaseContext, PhaseId, PhaseType, TimeLimit,
        VictoryCondition, VictoryPhase,
    };
    pub use colosseum_engine::{
        AllowAll, DescriptorProvider, EngineConfig, EngineHandle, JsonDescriptors, NoBackend,
        PermissionChecker, ProvisionError, ProvisioningBackend, Quota, ShutdownReport,
        StaticDescriptors,
    };
    pub use colosseum_types::{
        ArenaId, CompetitionId, JoinResult, Message, MessageSink, NullSink, PlayerId, Role,
    };
}
