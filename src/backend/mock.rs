//! Recording engine for unit tests (no intersection work at all)
//!
//! Every boundary call is appended to a shared log so tests can assert on the exact
//! call sequence after handing the engine to a world.

use crate::backend::{BufferHandle, ObjectRecord, RawHits, RayEngine, SensorRecord};
use crate::error::{RaySyncError, Result};
use crate::math::{TransformLayout, Vec3, WireMatrix};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitializeObjects { count: usize, enabled: Vec<i32> },
    UpdateEnabled { indices: Vec<u32>, values: Vec<i32> },
    UpdateTransforms { indices: Vec<u32>, matrices: Vec<WireMatrix> },
    SetSensors { records: Vec<SensorRecord> },
    CastRay,
    CastRayHit,
    FireCount,
    Fire { handle: u64 },
    Release { handle: u64, known: bool },
    AdvanceTime(f32),
    Shutdown,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<Call>,
    /// Name of a boundary call that should fail (e.g. "fire_sensors")
    pub fail_on: Option<&'static str>,
    /// Points returned by every fire
    pub hits: Vec<Vec3>,
    /// Answer for `cast_ray_hit`
    pub hit_point: Vec3,
    /// Fires that returned a handle the test has not yet seen released
    pub outstanding: HashMap<u64, Vec<Vec3>>,
    pub next_handle: u64,
}

impl MockState {
    pub fn fires(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Fire { .. }))
            .count()
    }

    pub fn releases(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Release { .. }))
            .count()
    }

    pub fn enabled_updates(&self) -> Vec<(Vec<u32>, Vec<i32>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::UpdateEnabled { indices, values } => Some((indices.clone(), values.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn transform_updates(&self) -> Vec<(Vec<u32>, Vec<WireMatrix>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::UpdateTransforms { indices, matrices } => {
                    Some((indices.clone(), matrices.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn sensor_pushes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::SetSensors { .. }))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct MockEngine {
    pub state: Arc<Mutex<MockState>>,
    pub layout: TransformLayout,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                next_handle: 1,
                ..Default::default()
            })),
            layout: TransformLayout::ColumnMajor,
        }
    }

    pub fn with_hits(hits: Vec<Vec3>) -> Self {
        let engine = Self::new();
        engine.state.lock().unwrap().hits = hits;
        engine
    }

    pub fn fail_on(&self, call: &'static str) {
        self.state.lock().unwrap().fail_on = Some(call);
    }

    pub fn clear_failure(&self) {
        self.state.lock().unwrap().fail_on = None;
    }

    fn record(&self, name: &'static str, call: Call) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.fail_on == Some(name) {
            return Err(RaySyncError::EngineCommunication(format!(
                "{} failed (mock)",
                name
            )));
        }
        Ok(())
    }
}

// SAFETY: fired buffers are kept in `outstanding` until released; a Vec's heap
// allocation is stable while the Vec itself moves between map slots.
unsafe impl RayEngine for MockEngine {
    fn transform_layout(&self) -> TransformLayout {
        self.layout
    }

    fn initialize_objects(&mut self, objects: &[ObjectRecord<'_>]) -> Result<()> {
        self.record(
            "initialize_objects",
            Call::InitializeObjects {
                count: objects.len(),
                enabled: objects.iter().map(|o| o.enabled).collect(),
            },
        )
    }

    fn update_enabled(&mut self, indices: &[u32], values: &[i32]) -> Result<()> {
        self.record(
            "update_enabled",
            Call::UpdateEnabled {
                indices: indices.to_vec(),
                values: values.to_vec(),
            },
        )
    }

    fn update_transforms(&mut self, indices: &[u32], matrices: &[WireMatrix]) -> Result<()> {
        self.record(
            "update_transforms",
            Call::UpdateTransforms {
                indices: indices.to_vec(),
                matrices: matrices.to_vec(),
            },
        )
    }

    fn set_sensors(&mut self, sensors: &[SensorRecord]) -> Result<()> {
        self.record(
            "set_sensors",
            Call::SetSensors {
                records: sensors.to_vec(),
            },
        )
    }

    fn cast_ray(&mut self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Result<bool> {
        self.record("cast_ray", Call::CastRay)?;
        Ok(self.state.lock().unwrap().hit_point != Vec3::ZERO)
    }

    fn cast_ray_hit(&mut self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Result<Vec3> {
        self.record("cast_ray_hit", Call::CastRayHit)?;
        Ok(self.state.lock().unwrap().hit_point)
    }

    fn fire_sensors_count(&mut self) -> Result<usize> {
        self.record("fire_sensors_count", Call::FireCount)?;
        Ok(self.state.lock().unwrap().hits.len())
    }

    fn fire_sensors(&mut self) -> Result<RawHits> {
        let mut state = self.state.lock().unwrap();
        let handle = state.next_handle;
        if state.fail_on == Some("fire_sensors") {
            return Err(RaySyncError::EngineCommunication(
                "fire_sensors failed (mock)".into(),
            ));
        }
        state.next_handle += 1;
        state.calls.push(Call::Fire { handle });

        let hits = state.hits.clone();
        let count = hits.len();
        let points = if count == 0 {
            std::ptr::null()
        } else {
            hits.as_ptr()
        };
        state.outstanding.insert(handle, hits);

        Ok(RawHits {
            handle: BufferHandle::new(handle),
            points,
            count,
        })
    }

    fn release(&mut self, handle: BufferHandle) -> bool {
        let mut state = self.state.lock().unwrap();
        let known = state.outstanding.remove(&handle.raw()).is_some();
        state.calls.push(Call::Release {
            handle: handle.raw(),
            known,
        });
        known
    }

    fn advance_time(&mut self, seconds: f32) {
        self.state.lock().unwrap().calls.push(Call::AdvanceTime(seconds));
    }

    fn shutdown(&mut self) {
        self.state.lock().unwrap().calls.push(Call::Shutdown);
    }
}
