//! The boundary to the native ray-intersection engine.
//!
//! Everything that crosses into the engine goes through [`RayEngine`]. The engine
//! keeps its own copy of the scene as parallel arrays indexed by registration
//! order; the sync layer keeps it in step with the host scene.
//!
//! Call shapes follow the engine's native ABI rather than the host's types:
//! matrices are flat [`WireMatrix`] arrays in the engine's [`TransformLayout`],
//! enabled flags are `0`/`1` integers, and sensor-fire results come back as an
//! engine-owned buffer plus a release handle ([`RawHits`]).
//!
//! [`SoftwareEngine`] is a CPU reference implementation used by the tests and the
//! demo. Production builds are expected to plug a hardware-accelerated engine in
//! behind the same trait.

pub mod sensor_rays;
pub mod software;

#[cfg(test)]
pub(crate) mod mock;

use crate::error::Result;
use crate::math::{TransformLayout, Vec3, WireMatrix};

pub use software::SoftwareEngine;

/// One object in the initial full-scene push.
///
/// `vertices` is borrowed from the host's buffer for the duration of the call. An
/// engine that needs the geometry afterwards must copy it.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRecord<'a> {
    pub vertices: &'a [Vec3],
    pub transform: WireMatrix,
    pub enabled: i32,
}

impl ObjectRecord<'_> {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// One sensor as laid out on the wire.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRecord {
    pub transform: WireMatrix,
    pub depth: f32,
    pub height: f32,
    pub radius: f32,
    pub sample_stride: f32,
    pub total_samples: u32,
}

/// Release token for an engine-owned hit buffer.
///
/// Neither `Clone` nor `Copy`: a handle is consumed by exactly one
/// [`RayEngine::release`] call.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A hit buffer as returned by the engine: handle, pointer, count.
///
/// Wrap it in [`HitBuffer`](crate::query::HitBuffer) right away; that type is the
/// only thing that reads through `points` and it releases `handle` on drop.
#[derive(Debug)]
pub struct RawHits {
    pub handle: BufferHandle,
    pub points: *const Vec3,
    pub count: usize,
}

/// The native ray-intersection engine.
///
/// All calls are synchronous and are never issued concurrently: the world holds the
/// engine exclusively and at most one hit buffer is outstanding at a time.
///
/// # Safety
///
/// Implementors guarantee that for every `RawHits` returned by
/// [`fire_sensors`](Self::fire_sensors), `points` is either null with `count == 0`
/// or points to `count` initialised, properly aligned `Vec3`s that remain valid
/// and unmodified until `handle` is passed to [`release`](Self::release).
pub unsafe trait RayEngine: Send {
    /// Element order the engine expects for matrices.
    fn transform_layout(&self) -> TransformLayout {
        TransformLayout::ColumnMajor
    }

    /// Replaces the engine's object arrays. Called once per registration, first.
    fn initialize_objects(&mut self, objects: &[ObjectRecord<'_>]) -> Result<()>;

    /// `values[i]` (0 or 1) becomes the enabled flag of object `indices[i]`.
    fn update_enabled(&mut self, indices: &[u32], values: &[i32]) -> Result<()>;

    /// `matrices[i]` becomes the world transform of object `indices[i]`.
    fn update_transforms(&mut self, indices: &[u32], matrices: &[WireMatrix]) -> Result<()>;

    /// Replaces the engine's sensor list wholesale.
    fn set_sensors(&mut self, sensors: &[SensorRecord]) -> Result<()>;

    fn cast_ray(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Result<bool>;

    /// Closest hit point, or `Vec3::ZERO` when nothing is hit.
    fn cast_ray_hit(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Result<Vec3>;

    /// Fires every sensor and reports only how many rays hit.
    fn fire_sensors_count(&mut self) -> Result<usize>;

    /// Fires every sensor and hands back the hit points in an engine-owned buffer.
    fn fire_sensors(&mut self) -> Result<RawHits>;

    /// Frees a buffer returned by `fire_sensors`. Returns `false` if the engine did
    /// not recognise the handle.
    fn release(&mut self, handle: BufferHandle) -> bool;

    /// Elapsed wall time in seconds, for time-dependent engine effects.
    fn advance_time(&mut self, _seconds: f32) {}

    /// Drops all retained scene and sensor state.
    fn shutdown(&mut self) {}
}
