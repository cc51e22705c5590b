//! Matchmaking engine for Colosseum.
//!
//! The engine keeps the registry of arenas, their maps and their live
//! competitions, and decides where a player who asks to join ends up: an
//! existing competition that accepts them, or a new one provisioned from a
//! template map while the arena's quota allows.
//!
//! The registry lives in a single Tokio task (actor model). Everything
//! else talks to it through an [`EngineHandle`]; permission checks and map
//! provisioning run in the caller's task and never block the actor.
//!
//! # Key types
//!
//! - [`EngineHandle`]: join, spectate, leave, arbitration, shutdown
//! - [`ArenaEngine`]: the registry itself, owned by the actor
//! - [`ProvisioningBackend`], [`PermissionChecker`], [`DescriptorProvider`]:
//!   collaborators supplied by the embedding application
//! - [`EngineConfig`]: quotas and tick rate

#![allow(async_fn_in_trait)]

mod actor;
mod config;
mod engine;
mod error;
mod handle;
mod reservation;
mod services;
mod shutdown;

pub use config::{ArenaSettings, DEFAULT_CHANNEL_SIZE, EngineConfig, Quota};
pub use engine::ArenaEngine;
pub use error::{EngineError, ProvisionError};
pub use handle::EngineHandle;
pub use reservation::Reservation;
pub use services::{
    AllowAll, DescriptorProvider, JsonDescriptors, NoBackend, PermissionChecker,
    ProvisioningBackend, StaticDescriptors,
};
pub use shutdown::{ConcludedCompetition, ShutdownCoordinator, ShutdownReport};
