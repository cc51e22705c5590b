//! Engine configuration.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Default command channel size for the engine actor.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Cap on live template-backed competitions per arena.
///
/// Serialized as a plain integer: `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Quota {
    Unlimited,
    Limited(usize),
}

impl Quota {
    /// `true` if `live` instances leave no room for another.
    pub fn is_met(&self, live: usize) -> bool {
        match self {
            Self::Unlimited => false,
            Self::Limited(max) => live >= *max,
        }
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::Limited(5)
    }
}

impl TryFrom<i64> for Quota {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Unlimited),
            n if n >= 0 => usize::try_from(n)
                .map(Self::Limited)
                .map_err(|_| format!("quota {n} is too large")),
            n => Err(format!("quota must be -1 or non-negative, got {n}")),
        }
    }
}

impl From<Quota> for i64 {
    fn from(quota: Quota) -> Self {
        match quota {
            Quota::Unlimited => -1,
            Quota::Limited(max) => i64::try_from(max).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Limited(max) => write!(f, "{max}"),
        }
    }
}

/// Per-arena overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArenaSettings {
    pub max_dynamic_instances: Option<Quota>,
}

/// Configuration for the matchmaking engine.
///
/// ```json
/// {
///   "maxDynamicInstances": 5,
///   "arenas": { "Siege": { "maxDynamicInstances": 1 } },
///   "tickRateHz": 20
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Global cap on live template-backed competitions per arena.
    pub max_dynamic_instances: Quota,

    /// Overrides keyed by arena name, matched ignoring case.
    pub arenas: HashMap<String, ArenaSettings>,

    /// Phase update rate in Hz. 0 = event-driven (no update ticks).
    pub tick_rate_hz: u32,

    /// Capacity of the engine actor's command channel.
    pub channel_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dynamic_instances: Quota::default(),
            arenas: HashMap::new(),
            tick_rate_hz: 20,
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The quota for `arena`, falling back to the global one.
    pub fn quota_for(&self, arena: &str) -> Quota {
        let key = arena.to_lowercase();
        self.arenas
            .iter()
            .find(|(name, _)| name.to_lowercase() == key)
            .and_then(|(_, settings)| settings.max_dynamic_instances)
            .unwrap_or(self.max_dynamic_instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_dynamic_instances, Quota::Limited(5));
        assert_eq!(config.tick_rate_hz, 20);
        assert_eq!(config.channel_size, DEFAULT_CHANNEL_SIZE);
    }

    #[test]
    fn test_minus_one_is_unlimited() {
        let config = EngineConfig::from_json(r#"{ "maxDynamicInstances": -1 }"#).unwrap();
        assert_eq!(config.max_dynamic_instances, Quota::Unlimited);
        assert!(!config.max_dynamic_instances.is_met(10_000));
    }

    #[test]
    fn test_other_negative_quota_is_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "maxDynamicInstances": -3 }"#),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_per_arena_override() {
        let config = EngineConfig::from_json(
            r#"{
                "maxDynamicInstances": 4,
                "arenas": { "Siege": { "maxDynamicInstances": 1 } },
                "tickRateHz": 0
            }"#,
        )
        .unwrap();
        assert_eq!(config.quota_for("Siege"), Quota::Limited(1));
        assert_eq!(config.quota_for("Duel"), Quota::Limited(4));
        assert_eq!(config.tick_rate_hz, 0);
        assert!(Quota::Limited(1).is_met(1));
        assert!(!Quota::Limited(1).is_met(0));
    }

    #[test]
    fn test_per_arena_override_ignores_case() {
        let config = EngineConfig::from_json(
            r#"{ "maxDynamicInstances": 4, "arenas": { "siege": { "maxDynamicInstances": 1 } } }"#,
        )
        .unwrap();
        assert_eq!(config.quota_for("Siege"), Quota::Limited(1));
        assert_eq!(config.quota_for("SIEGE"), Quota::Limited(1));
        assert_eq!(config.quota_for("Duel"), Quota::Limited(4));
    }

    #[test]
    fn test_quota_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Quota::Unlimited).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Quota::Limited(3)).unwrap(), "3");
    }
}
