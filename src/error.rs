//! Error types for RaySync

use crate::engine::SessionState;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaySyncError {
    #[error("No scene objects matched the registration filter")]
    NoTargets,

    #[error("No sensors configured")]
    NoSensors,

    #[error("Continuous session already active (state: {0:?})")]
    SessionActive(SessionState),

    #[error("Scene has not been registered with the engine")]
    NotInitialized,

    #[error("Scene is already registered with the engine; shut down before re-registering")]
    AlreadyInitialized,

    #[error("Object index {index} is outside the registered range 0..{count}")]
    InvalidIndex { index: u32, count: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Engine communication error: {0}")]
    EngineCommunication(String),

    #[error("Engine call `{call}` took {elapsed:?}, exceeding the {limit:?} bound")]
    EngineTimeout {
        call: &'static str,
        elapsed: Duration,
        limit: Duration,
    },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Hit-point consumer panicked: {0}")]
    ConsumerPanicked(String),
}

impl RaySyncError {
    /// Errors caused by how the caller set things up. These never reach the engine.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoTargets
                | Self::NoSensors
                | Self::SessionActive(_)
                | Self::NotInitialized
                | Self::AlreadyInitialized
                | Self::InvalidIndex { .. }
                | Self::Configuration(_)
        )
    }

    /// Errors reported by, or while talking to, the engine across the boundary.
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Self::EngineCommunication(_) | Self::EngineTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RaySyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(RaySyncError::NoTargets.is_configuration());
        assert!(RaySyncError::SessionActive(SessionState::Running).is_configuration());
        assert!(!RaySyncError::NoSensors.is_engine_failure());

        let timeout = RaySyncError::EngineTimeout {
            call: "fire_sensors",
            elapsed: Duration::from_millis(30),
            limit: Duration::from_millis(10),
        };
        assert!(timeout.is_engine_failure());
        assert!(!timeout.is_configuration());
        assert!(RaySyncError::EngineCommunication("boom".into()).is_engine_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = RaySyncError::InvalidIndex { index: 7, count: 3 };
        assert_eq!(
            err.to_string(),
            "Object index 7 is outside the registered range 0..3"
        );
        assert_eq!(RaySyncError::NoSensors.to_string(), "No sensors configured");
    }
}
