//! Scan lifecycle.

use std::fmt;

/// Where a single scan is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Pending,
    Running,
    Aggregated,
    Logged,
    LogFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal scan state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: ScanState,
    pub to: ScanState,
}

impl ScanState {
    /// Move to `next` if the lifecycle allows it.
    pub fn advance(self, next: ScanState) -> Result<ScanState, InvalidTransition> {
        use ScanState::*;
        match (self, next) {
            (Pending, Running) | (Running, Aggregated) | (Aggregated, Logged) | (Aggregated, LogFailed) => {
                Ok(next)
            }
            _ => Err(InvalidTransition { from: self, to: next }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Logged | Self::LogFailed)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Aggregated => "aggregated",
            Self::Logged => "logged",
            Self::LogFailed => "log_failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = ScanState::Pending
            .advance(ScanState::Running)
            .and_then(|s| s.advance(ScanState::Aggregated))
            .and_then(|s| s.advance(ScanState::Logged))
            .unwrap();
        assert!(state.is_terminal());
        assert!(ScanState::Aggregated.advance(ScanState::LogFailed).is_ok());
    }

    #[test]
    fn test_illegal_transitions() {
        let err = ScanState::Pending.advance(ScanState::Logged).unwrap_err();
        assert_eq!(err.to_string(), "illegal scan state transition pending -> logged");
        assert!(ScanState::Running.advance(ScanState::Logged).is_err());
        assert!(ScanState::Logged.advance(ScanState::Running).is_err());
        assert!(ScanState::LogFailed.advance(ScanState::Logged).is_err());
    }
}
