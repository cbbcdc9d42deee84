use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where step increments come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Steps come from the accelerometer-based detector.
    Auto,
    /// Steps come from explicit `advance_step` commands.
    Manual,
}

/// Lifecycle status of a navigation session.
///
/// `Idle → Navigating ⇄ Paused`, with `Arrived` and `Stopped` terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStatus {
    Idle,
    Navigating,
    Paused,
    Arrived,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{command} is not legal while the session is {status:?}")]
    InvalidTransition {
        command: &'static str,
        status: NavigationStatus,
    },
    #[error("advance_step is only accepted in manual mode")]
    StepCommandInAutoMode,
    #[error("automatic step detection is unavailable without motion sensors")]
    AutoModeUnavailable,
    #[error("heading override is only available while the magnetometer is absent")]
    HeadingOverrideUnavailable,
}

impl NavigationStatus {
    /// Terminal states admit no further progress mutation.
    pub fn is_terminal(self) -> bool {
        matches!(self, NavigationStatus::Arrived | NavigationStatus::Stopped)
    }

    /// Whether step inputs (sensor or manual) may advance progress.
    pub fn accepts_steps(self) -> bool {
        self == NavigationStatus::Navigating
    }

    /// Whether heading samples still update the session. Heading is
    /// non-mutating for progress, so it keeps flowing while paused.
    pub fn accepts_heading(self) -> bool {
        matches!(self, NavigationStatus::Navigating | NavigationStatus::Paused)
    }

    pub fn try_start(self) -> Result<Self, CommandError> {
        match self {
            NavigationStatus::Idle => Ok(NavigationStatus::Navigating),
            status => Err(CommandError::InvalidTransition {
                command: "start",
                status,
            }),
        }
    }

    pub fn try_pause(self) -> Result<Self, CommandError> {
        match self {
            NavigationStatus::Navigating => Ok(NavigationStatus::Paused),
            status => Err(CommandError::InvalidTransition {
                command: "pause",
                status,
            }),
        }
    }

    pub fn try_resume(self) -> Result<Self, CommandError> {
        match self {
            NavigationStatus::Paused => Ok(NavigationStatus::Navigating),
            status => Err(CommandError::InvalidTransition {
                command: "resume",
                status,
            }),
        }
    }

    /// `stop` is idempotent from the terminal states: the caller gets the
    /// unchanged status back and must not re-announce.
    pub fn try_stop(self) -> Result<Self, CommandError> {
        match self {
            NavigationStatus::Navigating | NavigationStatus::Paused => {
                Ok(NavigationStatus::Stopped)
            }
            NavigationStatus::Arrived | NavigationStatus::Stopped => Ok(self),
            NavigationStatus::Idle => Err(CommandError::InvalidTransition {
                command: "stop",
                status: NavigationStatus::Idle,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_only_legal_from_idle() {
        assert_eq!(
            NavigationStatus::Idle.try_start().unwrap(),
            NavigationStatus::Navigating
        );
        for status in [
            NavigationStatus::Navigating,
            NavigationStatus::Paused,
            NavigationStatus::Arrived,
            NavigationStatus::Stopped,
        ] {
            assert!(matches!(
                status.try_start(),
                Err(CommandError::InvalidTransition {
                    command: "start",
                    ..
                })
            ));
        }
    }

    #[test]
    fn pause_resume_toggle() {
        let paused = NavigationStatus::Navigating.try_pause().unwrap();
        assert_eq!(paused, NavigationStatus::Paused);
        assert_eq!(paused.try_resume().unwrap(), NavigationStatus::Navigating);

        assert!(NavigationStatus::Idle.try_resume().is_err());
        assert!(NavigationStatus::Paused.try_pause().is_err());
        assert!(NavigationStatus::Arrived.try_pause().is_err());
    }

    #[test]
    fn stop_is_a_noop_from_terminal_states() {
        assert_eq!(
            NavigationStatus::Navigating.try_stop().unwrap(),
            NavigationStatus::Stopped
        );
        assert_eq!(
            NavigationStatus::Paused.try_stop().unwrap(),
            NavigationStatus::Stopped
        );
        assert_eq!(
            NavigationStatus::Stopped.try_stop().unwrap(),
            NavigationStatus::Stopped
        );
        assert_eq!(
            NavigationStatus::Arrived.try_stop().unwrap(),
            NavigationStatus::Arrived
        );
        assert!(NavigationStatus::Idle.try_stop().is_err());
    }

    #[test]
    fn step_and_heading_gates() {
        assert!(NavigationStatus::Navigating.accepts_steps());
        assert!(!NavigationStatus::Paused.accepts_steps());
        assert!(NavigationStatus::Paused.accepts_heading());
        assert!(!NavigationStatus::Stopped.accepts_heading());
        assert!(NavigationStatus::Arrived.is_terminal());
    }
}
