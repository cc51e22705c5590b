//! `Colosseum` builder and boot sequence.
//!
//! Boot wires the collaborators together, spawns the engine actor and
//! registers every arena with the maps its descriptor provider knows about.
//! Fixed maps get their competition during registration.

use std::future::Future;
use std::sync::Arc;

use colosseum_competition::ArenaType;
use colosseum_engine::{
    AllowAll, DescriptorProvider, EngineConfig, EngineHandle, NoBackend, PermissionChecker,
    ProvisioningBackend, ShutdownReport, StaticDescriptors,
};
use colosseum_types::{ArenaId, MessageSink, NullSink};

use crate::ColosseumError;

/// Builder for configuring and booting a [`Colosseum`].
///
/// # Example
///
/// ```rust,no_run
/// use colosseum::prelude::*;
///
/// # async fn boot() -> Result<(), ColosseumError> {
/// let colosseum = Colosseum::builder()
///     .arena(ArenaType::standard("Duel", CompetitionConfig::default()))
///     .descriptors(StaticDescriptors::new().with("Duel", vec![MapDescriptor::fixed("pit")]))
///     .start()
///     .await?;
/// colosseum.engine().join(PlayerId(1), "Duel", None).await;
/// # Ok(())
/// # }
/// ```
pub struct ColosseumBuilder<P: PermissionChecker, B: ProvisioningBackend> {
    config: EngineConfig,
    arenas: Vec<ArenaType>,
    descriptors: Box<dyn DescriptorProvider>,
    permissions: P,
    backend: B,
    sink: Arc<dyn MessageSink>,
}

impl ColosseumBuilder<AllowAll, NoBackend> {
    /// A builder with default configuration, no arenas, every permission
    /// granted, no provisioning backend and messages dropped.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            arenas: Vec::new(),
            descriptors: Box::new(StaticDescriptors::new()),
            permissions: AllowAll,
            backend: NoBackend,
            sink: Arc::new(NullSink),
        }
    }
}

impl Default for ColosseumBuilder<AllowAll, NoBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PermissionChecker, B: ProvisioningBackend> ColosseumBuilder<P, B> {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses the engine configuration from JSON.
    pub fn config_json(mut self, json: &str) -> Result<Self, ColosseumError> {
        self.config = EngineConfig::from_json(json)?;
        Ok(self)
    }

    /// Adds an arena. Arenas are registered in the order they were added.
    pub fn arena(mut self, arena: ArenaType) -> Self {
        self.arenas.push(arena);
        self
    }

    pub fn descriptors(mut self, provider: impl DescriptorProvider) -> Self {
        self.descriptors = Box::new(provider);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn permissions<P2: PermissionChecker>(self, permissions: P2) -> ColosseumBuilder<P2, B> {
        ColosseumBuilder {
            config: self.config,
            arenas: self.arenas,
            descriptors: self.descriptors,
            permissions,
            backend: self.backend,
            sink: self.sink,
        }
    }

    pub fn backend<B2: ProvisioningBackend>(self, backend: B2) -> ColosseumBuilder<P, B2> {
        ColosseumBuilder {
            config: self.config,
            arenas: self.arenas,
            descriptors: self.descriptors,
            permissions: self.permissions,
            backend,
            sink: self.sink,
        }
    }

    /// Spawns the engine and registers every arena.
    ///
    /// Must be called from within a Tokio runtime. Bad maps are logged and
    /// skipped by the engine; a duplicate arena name fails the boot.
    pub async fn start(self) -> Result<Colosseum<P, B>, ColosseumError> {
        let engine = EngineHandle::spawn(self.config, self.permissions, self.backend, self.sink);

        let mut arenas = Vec::with_capacity(self.arenas.len());
        for arena in self.arenas {
            let name = arena.name().to_string();
            let maps = self.descriptors.descriptors(&name);
            let offered = maps.len();
            let id = engine.register_arena(arena, maps).await?;
            tracing::info!(arena = %name, arena_id = %id, maps = offered, "arena booted");
            arenas.push((id, name));
        }

        tracing::info!(arenas = arenas.len(), "colosseum started");
        Ok(Colosseum { engine, arenas })
    }
}

/// A running Colosseum.
pub struct Colosseum<P: PermissionChecker, B: ProvisioningBackend> {
    engine: EngineHandle<P, B>,
    arenas: Vec<(ArenaId, String)>,
}

impl Colosseum<AllowAll, NoBackend> {
    pub fn builder() -> ColosseumBuilder<AllowAll, NoBackend> {
        ColosseumBuilder::new()
    }
}

impl<P: PermissionChecker, B: ProvisioningBackend> Colosseum<P, B> {
    /// The engine handle. Clone it to share it with other tasks.
    pub fn engine(&self) -> &EngineHandle<P, B> {
        &self.engine
    }

    /// Arenas registered at boot, in registration order.
    pub fn arenas(&self) -> impl Iterator<Item = (ArenaId, &str)> + '_ {
        self.arenas.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Waits for `signal`, then shuts the engine down.
    ///
    /// Returns `None` if the engine was already shut down elsewhere.
    pub async fn run_until(self, signal: impl Future<Output = ()>) -> Option<ShutdownReport> {
        signal.await;
        tracing::info!("stop signal received");
        self.engine.shutdown().await
    }
}
