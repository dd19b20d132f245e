//! Event types for RaySync

use crate::engine::SessionState;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum RaySyncEvent {
    SessionStateChanged {
        session_id: Uuid,
        old: SessionState,
        new: SessionState,
    },
    HitPointsDelivered {
        session_id: Uuid,
        count: usize,
        tick_duration: Duration,
    },
    TickFailed {
        session_id: Uuid,
        error: String,
    },
}

impl RaySyncEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::SessionStateChanged { session_id, .. }
            | Self::HitPointsDelivered { session_id, .. }
            | Self::TickFailed { session_id, .. } => *session_id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::TickFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let id = Uuid::new_v4();
        let failed = RaySyncEvent::TickFailed {
            session_id: id,
            error: "boom".into(),
        };
        assert!(failed.is_error());
        assert_eq!(failed.session_id(), id);

        let changed = RaySyncEvent::SessionStateChanged {
            session_id: id,
            old: SessionState::Idle,
            new: SessionState::Armed,
        };
        assert!(!changed.is_error());
    }
}
