use serde::{Deserialize, Serialize};
use std::fmt;

/// Session lifecycle status.
///
/// Transitions are exactly `Waiting -> Active` (second player joins) and
/// `Active -> Finished` (terminal move). `Finished` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    /// Session created, waiting for a second player
    #[default]
    Waiting,
    /// Both players seated, moves are being exchanged
    Active,
    /// Win or draw recorded; no further moves accepted
    Finished,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SessionStatus {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "WAITING" => Some(Self::Waiting),
            "ACTIVE" => Some(Self::Active),
            "FINISHED" => Some(Self::Finished),
            _ => None,
        }
    }

    /// Convert to database string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Active => "ACTIVE",
            Self::Finished => "FINISHED",
        }
    }

    /// Check if a second player can still join
    pub const fn can_join(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Check if moves are accepted
    pub const fn accepts_moves(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if the session reached its terminal state
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(SessionStatus::from_str("WAITING"), Some(SessionStatus::Waiting));
        assert_eq!(SessionStatus::from_str("waiting"), Some(SessionStatus::Waiting));
        assert_eq!(SessionStatus::from_str("ACTIVE"), Some(SessionStatus::Active));
        assert_eq!(SessionStatus::from_str("FINISHED"), Some(SessionStatus::Finished));
        assert_eq!(SessionStatus::from_str("ended"), None);
    }

    #[test]
    fn test_as_str_round_trip() {
        for status in [
            SessionStatus::Waiting,
            SessionStatus::Active,
            SessionStatus::Finished,
        ] {
            assert_eq!(SessionStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_can_join() {
        assert!(SessionStatus::Waiting.can_join());
        assert!(!SessionStatus::Active.can_join());
        assert!(!SessionStatus::Finished.can_join());
    }

    #[test]
    fn test_accepts_moves() {
        assert!(!SessionStatus::Waiting.accepts_moves());
        assert!(SessionStatus::Active.accepts_moves());
        assert!(!SessionStatus::Finished.accepts_moves());
    }

    #[test]
    fn test_default() {
        assert_eq!(SessionStatus::default(), SessionStatus::Waiting);
    }
}
