use crate::error::{RaySyncError, Result};
use crate::math::Mat4;
use crate::scene::transform::TrackedTransform;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Field parameters of a virtual sensor.
///
/// A sensor casts a grid of rays: `rows = ceil(height / stride)` vertical steps
/// and `columns = ceil(radius / stride)` horizontal steps. `radius` is the
/// horizontal field of view in degrees, so `stride` is a linear gap vertically
/// and an angular gap horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorParams {
    /// Maximum ray distance along the sensor's forward axis
    pub depth: f32,
    /// Vertical extent of the ray grid at `depth`
    pub height: f32,
    /// Horizontal field of view in degrees
    pub radius: f32,
    /// Gap between neighbouring rays
    pub stride: f32,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            depth: 14.0,
            height: 10.0,
            radius: 30.0,
            stride: 0.2,
        }
    }
}

impl SensorParams {
    pub fn new(depth: f32, height: f32, radius: f32, stride: f32) -> Self {
        Self {
            depth,
            height,
            radius,
            stride,
        }
    }

    pub fn rows(&self) -> u32 {
        (self.height / self.stride).ceil() as u32
    }

    pub fn columns(&self) -> u32 {
        (self.radius / self.stride).ceil() as u32
    }

    /// Number of rays one fire of this sensor casts.
    pub fn sample_count(&self) -> u64 {
        u64::from(self.rows()) * u64::from(self.columns())
    }

    /// [`sample_count`](Self::sample_count) as sent to the engine, saturating at
    /// `u32::MAX`. Validated parameters always fit.
    pub fn total_samples(&self) -> u32 {
        u32::try_from(self.sample_count()).unwrap_or(u32::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("depth", self.depth),
            ("height", self.height),
            ("radius", self.radius),
            ("stride", self.stride),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(RaySyncError::Configuration(format!(
                    "sensor {} must be positive and finite, got {}",
                    name, value
                )));
            }
        }

        let samples = self.sample_count();
        if samples > u64::from(u32::MAX) {
            return Err(RaySyncError::Configuration(format!(
                "sensor casts {} rays per fire, more than the engine accepts ({})",
                samples,
                u32::MAX
            )));
        }
        Ok(())
    }
}

/// A virtual sensor: a pose plus field parameters.
///
/// Either moving the sensor or changing its parameters marks it dirty; the dirty
/// state is consumed by [`take_dirty`](Self::take_dirty).
#[derive(Debug)]
pub struct Sensor {
    name: String,
    transform: TrackedTransform,
    params: RwLock<SensorParams>,
    params_changed: AtomicBool,
}

impl Sensor {
    pub fn new(name: impl Into<String>, transform: Mat4, params: SensorParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            transform: TrackedTransform::new(transform),
            params: RwLock::new(params),
            params_changed: AtomicBool::new(false),
        })
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> &TrackedTransform {
        &self.transform
    }

    pub fn params(&self) -> SensorParams {
        *self.params.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the field parameters. Invalid parameters are rejected and leave the
    /// sensor unchanged.
    pub fn set_params(&self, params: SensorParams) -> Result<()> {
        params.validate()?;
        let mut current = self.params.write().unwrap_or_else(PoisonError::into_inner);
        if *current != params {
            *current = params;
            self.params_changed.store(true, Ordering::Release);
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.transform.is_changed() || self.params_changed.load(Ordering::Acquire)
    }

    /// Returns whether the sensor moved or changed since the last call, clearing both flags.
    pub fn take_dirty(&self) -> bool {
        let moved = self.transform.take_changed();
        let changed = self.params_changed.swap(false, Ordering::AcqRel);
        moved || changed
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            transform: self.transform.matrix(),
            params: self.params(),
        }
    }
}

/// Point-in-time copy of a sensor's state, as pushed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub transform: Mat4,
    pub params: SensorParams,
}
