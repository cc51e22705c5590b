//! Collaborators the engine depends on.
//!
//! Colosseum does not load map files, copy regions or check permissions
//! itself. It asks these traits, which the embedding application
//! implements. Each trait ships with a minimal implementation for tests
//! and demos.

use std::collections::HashMap;
use std::future::Future;

use colosseum_competition::{MapDescriptor, MapInstance};
use colosseum_types::PlayerId;

use crate::{EngineError, ProvisionError};

/// Supplies the map descriptors of an arena at boot.
pub trait DescriptorProvider: Send + Sync + 'static {
    fn descriptors(&self, arena: &str) -> Vec<MapDescriptor>;
}

/// Creates and destroys copies of template maps.
///
/// # Example
///
/// ```rust
/// use colosseum_competition::{MapDescriptor, MapInstance};
/// use colosseum_engine::{ProvisionError, ProvisioningBackend};
///
/// /// Places every copy 1000 blocks further along the x axis.
/// struct Strip;
///
/// impl ProvisioningBackend for Strip {
///     fn is_available(&self) -> bool {
///         true
///     }
///
///     async fn instantiate(
///         &self,
///         _arena: &str,
///         map: &MapDescriptor,
///     ) -> Result<MapInstance, ProvisionError> {
///         Ok(MapInstance { id: 1, map: map.name.clone(), origin: [1000, 0, 0] })
///     }
/// }
/// ```
pub trait ProvisioningBackend: Send + Sync + 'static {
    /// Whether dynamic provisioning is possible at all right now.
    fn is_available(&self) -> bool;

    /// Copies `map` into a fresh instance.
    ///
    /// Called outside the engine actor; may take as long as it needs.
    fn instantiate(
        &self,
        arena: &str,
        map: &MapDescriptor,
    ) -> impl Future<Output = Result<MapInstance, ProvisionError>> + Send;

    /// Tears down an instance whose competition was removed.
    fn release(&self, _instance: MapInstance) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Decides whether a player holds a permission node such as
/// `colosseum.duel.join`.
pub trait PermissionChecker: Send + Sync + 'static {
    fn check(&self, player: PlayerId, node: &str) -> impl Future<Output = bool> + Send;
}

/// Grants every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    async fn check(&self, _player: PlayerId, _node: &str) -> bool {
        true
    }
}

/// A backend for deployments without dynamic maps. Never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackend;

impl ProvisioningBackend for NoBackend {
    fn is_available(&self) -> bool {
        false
    }

    async fn instantiate(
        &self,
        _arena: &str,
        map: &MapDescriptor,
    ) -> Result<MapInstance, ProvisionError> {
        Err(ProvisionError::new(
            map.name.clone(),
            "no provisioning backend installed",
        ))
    }
}

/// Descriptors held in memory, keyed by arena name.
#[derive(Debug, Clone, Default)]
pub struct StaticDescriptors {
    maps: HashMap<String, Vec<MapDescriptor>>,
}

impl StaticDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, arena: impl Into<String>, maps: Vec<MapDescriptor>) -> Self {
        self.maps.entry(arena.into()).or_default().extend(maps);
        self
    }
}

impl DescriptorProvider for StaticDescriptors {
    fn descriptors(&self, arena: &str) -> Vec<MapDescriptor> {
        self.maps.get(arena).cloned().unwrap_or_default()
    }
}

/// Descriptors parsed from a JSON document of the form
/// `{ "<arena>": [ { "name": ..., "kind": ..., "bounds": ... } ] }`.
///
/// Entries that fail to parse are logged and skipped; one bad map does not
/// take the rest of its arena down with it.
#[derive(Debug, Clone, Default)]
pub struct JsonDescriptors {
    maps: HashMap<String, Vec<MapDescriptor>>,
}

impl JsonDescriptors {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let raw: HashMap<String, Vec<serde_json::Value>> = serde_json::from_str(json)?;
        let mut maps = HashMap::with_capacity(raw.len());
        for (arena, entries) in raw {
            let parsed: Vec<MapDescriptor> = entries
                .into_iter()
                .enumerate()
                .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                    Ok(map) => Some(map),
                    Err(err) => {
                        tracing::error!(%arena, index, error = %err, "skipping malformed map descriptor");
                        None
                    }
                })
                .collect();
            maps.insert(arena, parsed);
        }
        Ok(Self { maps })
    }
}

impl DescriptorProvider for JsonDescriptors {
    fn descriptors(&self, arena: &str) -> Vec<MapDescriptor> {
        self.maps.get(arena).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use colosseum_competition::{Bounds, MapKind};

    use super::*;

    #[test]
    fn test_static_descriptors_by_arena() {
        let provider = StaticDescriptors::new()
            .with("Duel", vec![MapDescriptor::fixed("pit")])
            .with(
                "Siege",
                vec![MapDescriptor::template("keep", Bounds::new([0; 3], [9; 3]))],
            );
        assert_eq!(provider.descriptors("Duel").len(), 1);
        assert!(provider.descriptors("Siege")[0].is_template());
        assert!(provider.descriptors("Race").is_empty());
    }

    #[test]
    fn test_json_descriptors_skip_malformed_entries() {
        let provider = JsonDescriptors::from_json(
            r#"{
                "Siege": [
                    { "name": "keep", "kind": "template", "bounds": { "min": [0,0,0], "max": [9,9,9] } },
                    { "name": "broken", "kind": "floating" },
                    { "name": "gate", "kind": "fixed" }
                ]
            }"#,
        )
        .unwrap();
        let maps = provider.descriptors("Siege");
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].name, "keep");
        assert_eq!(maps[1].kind, MapKind::Fixed);
    }

    #[test]
    fn test_json_descriptors_reject_bad_document() {
        assert!(matches!(
            JsonDescriptors::from_json("[1, 2]"),
            Err(EngineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_builtin_collaborators() {
        assert!(AllowAll.check(PlayerId(1), "colosseum.duel.join").await);
        assert!(!NoBackend.is_available());
        assert!(
            NoBackend
                .instantiate("Siege", &MapDescriptor::fixed("gate"))
                .await
                .is_err()
        );
    }
}
