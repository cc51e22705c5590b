//! Roles and join results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Message;

/// How a player takes part in a competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Competes and counts towards player capacity and victory conditions.
    Playing,
    /// Watches; never counted by victory conditions.
    Spectating,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Spectating => write!(f, "spectating"),
        }
    }
}

/// Whether a join was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    Success,
    Rejected,
}

/// Result of asking a competition whether a player may join.
///
/// A rejection always carries the message explaining why, so callers can
/// forward it to the player without inventing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResult {
    pub outcome: JoinOutcome,
    pub message: Option<Message>,
}

impl JoinResult {
    pub fn success() -> Self {
        Self {
            outcome: JoinOutcome::Success,
            message: None,
        }
    }

    pub fn rejected(message: Message) -> Self {
        Self {
            outcome: JoinOutcome::Rejected,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == JoinOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_message() {
        let result = JoinResult::success();
        assert!(result.is_success());
        assert!(result.message.is_none());
    }

    #[test]
    fn test_rejection_carries_reason() {
        let result = JoinResult::rejected(Message::ArenaFull);
        assert!(!result.is_success());
        assert_eq!(result.message, Some(Message::ArenaFull));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Spectating).unwrap(), "\"spectating\"");
    }
}
