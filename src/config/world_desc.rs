use crate::config::ObjectFilter;
use crate::error::{RaySyncError, Result};
use crate::scene::TransformHandle;
use std::time::Duration;

/// Configuration descriptor for a RaySync world and its update loop
#[derive(Debug, Clone)]
pub struct RaySyncDesc {
    /// Tick rate of the continuous loop in ticks per second. `0.0` runs uncapped.
    pub target_rate: f32,
    /// Centre used for distance culling. `None` keeps every object enabled.
    pub origin: Option<TransformHandle>,
    /// Objects at or beyond this distance from `origin` are disabled in the engine
    pub max_distance_from_origin: f32,
    /// Which objects from the object source get registered
    pub object_filter: ObjectFilter,
    /// Upper bound on a single boundary call. `None` disables the check.
    pub boundary_timeout: Option<Duration>,
}

impl Default for RaySyncDesc {
    fn default() -> Self {
        Self {
            target_rate: 60.0,
            origin: None,
            max_distance_from_origin: 100.0,
            object_filter: ObjectFilter::default(),
            boundary_timeout: Some(Duration::from_secs(2)),
        }
    }
}

impl RaySyncDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_rate(mut self, rate: f32) -> Self {
        self.target_rate = rate;
        self
    }

    pub fn origin(mut self, origin: TransformHandle, max_distance: f32) -> Self {
        self.origin = Some(origin);
        self.max_distance_from_origin = max_distance;
        self
    }

    pub fn object_filter(mut self, filter: ObjectFilter) -> Self {
        self.object_filter = filter;
        self
    }

    pub fn boundary_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.boundary_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_rate.is_finite() || self.target_rate < 0.0 {
            return Err(RaySyncError::Configuration(format!(
                "target rate must be zero (uncapped) or a positive number, got {}",
                self.target_rate
            )));
        }

        if self.origin.is_some()
            && !(self.max_distance_from_origin.is_finite() && self.max_distance_from_origin > 0.0)
        {
            return Err(RaySyncError::Configuration(format!(
                "max distance from origin must be positive, got {}",
                self.max_distance_from_origin
            )));
        }

        Ok(())
    }

    /// Time between tick starts, or `None` when the loop is uncapped.
    pub fn tick_interval(&self) -> Option<Duration> {
        tick_interval(self.target_rate)
    }
}

/// Converts a tick rate to an interval without ever dividing by zero.
pub(crate) fn tick_interval(rate: f32) -> Option<Duration> {
    if rate > 0.0 && rate.is_finite() {
        Some(Duration::from_secs_f32(1.0 / rate))
    } else {
        None
    }
}
