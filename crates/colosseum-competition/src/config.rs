//! Per-arena competition rules.

use serde::{Deserialize, Serialize};

/// Join rules shared by every competition of an arena type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompetitionConfig {
    /// Playing members needed before the waiting phase moves on.
    pub min_players: usize,

    /// Maximum playing members.
    pub max_players: usize,

    /// Whether spectators are allowed at all.
    pub allow_spectators: bool,

    /// Maximum number of spectators (0 = unlimited when allowed).
    pub max_spectators: usize,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 8,
            allow_spectators: true,
            max_spectators: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompetitionConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 8);
        assert!(config.allow_spectators);
        assert_eq!(config.max_spectators, 0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CompetitionConfig =
            serde_json::from_str(r#"{ "maxPlayers": 2, "allowSpectators": false }"#).unwrap();
        assert_eq!(config.max_players, 2);
        assert!(!config.allow_spectators);
        assert_eq!(config.min_players, 2);
    }
}
