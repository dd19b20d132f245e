use crate::backend::{ObjectRecord, RayEngine, SensorRecord};
use crate::error::{RaySyncError, Result};
use crate::math::{TransformLayout, WireMatrix};
use crate::scene::SensorSnapshot;
use crate::sync::objects::{ObjectDelta, ObjectEntry};
use std::time::{Duration, Instant};

/// Counters for boundary traffic, mostly for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub full_pushes: u64,
    pub enabled_pushes: u64,
    pub transform_pushes: u64,
    pub sensor_pushes: u64,
    /// Delta syncs skipped because nothing changed
    pub elided: u64,
}

/// Serialises registry state into boundary calls.
///
/// Owns the call ordering rules: one full-scene push per registration, before any
/// delta; empty deltas never cross the boundary; every index sent lies inside the
/// registered range. All calls are synchronous.
#[derive(Debug)]
pub struct SyncProtocol {
    layout: TransformLayout,
    timeout: Option<Duration>,
    initialized: bool,
    object_count: usize,
    stats: SyncStats,
}

impl SyncProtocol {
    pub fn new(layout: TransformLayout, timeout: Option<Duration>) -> Self {
        Self {
            layout,
            timeout,
            initialized: false,
            object_count: 0,
            stats: SyncStats::default(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Object count of the last full-scene push.
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn layout(&self) -> TransformLayout {
        self.layout
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Forgets the registration so a new full push is allowed.
    pub fn reset(&mut self) {
        self.initialized = false;
        self.object_count = 0;
    }

    /// Sends every object once. Vertex buffers are lent, not copied.
    pub fn push_full_scene<E: RayEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        entries: &[ObjectEntry],
    ) -> Result<()> {
        if self.initialized {
            return Err(RaySyncError::AlreadyInitialized);
        }

        let records: Vec<ObjectRecord<'_>> = entries
            .iter()
            .map(|entry| ObjectRecord {
                vertices: entry.object().vertices(),
                transform: self.layout.to_wire(&entry.object().transform().matrix()),
                enabled: entry.enabled() as i32,
            })
            .collect();

        self.bounded("initialize_objects", || engine.initialize_objects(&records))?;

        self.initialized = true;
        self.object_count = entries.len();
        self.stats.full_pushes += 1;
        log::info!("Registered {} objects with the engine", entries.len());
        Ok(())
    }

    /// Sends an object delta. Returns `false` without touching the engine when the
    /// delta is empty.
    pub fn push_object_deltas<E: RayEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        delta: &ObjectDelta,
    ) -> Result<bool> {
        if !self.initialized {
            return Err(RaySyncError::NotInitialized);
        }
        if delta.is_empty() {
            self.stats.elided += 1;
            return Ok(false);
        }

        self.check_indices(&delta.enabled.indices)?;
        self.check_indices(&delta.transforms.indices)?;

        if !delta.enabled.indices.is_empty() {
            let values: Vec<i32> = delta.enabled.values.iter().map(|&v| v as i32).collect();
            log::trace!("Pushing {} enabled flips", values.len());
            self.bounded("update_enabled", || {
                engine.update_enabled(&delta.enabled.indices, &values)
            })?;
            self.stats.enabled_pushes += 1;
        }

        if !delta.transforms.indices.is_empty() {
            let matrices: Vec<WireMatrix> = delta
                .transforms
                .matrices
                .iter()
                .map(|m| self.layout.to_wire(m))
                .collect();
            log::trace!("Pushing {} transforms", matrices.len());
            self.bounded("update_transforms", || {
                engine.update_transforms(&delta.transforms.indices, &matrices)
            })?;
            self.stats.transform_pushes += 1;
        }

        Ok(true)
    }

    /// Replaces the engine's sensor list with `sensors`.
    pub fn push_sensor_set<E: RayEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        sensors: &[SensorSnapshot],
    ) -> Result<()> {
        let records: Vec<SensorRecord> = sensors
            .iter()
            .map(|snapshot| self.sensor_record(snapshot))
            .collect();

        log::trace!("Pushing {} sensors", records.len());
        self.bounded("set_sensors", || engine.set_sensors(&records))?;
        self.stats.sensor_pushes += 1;
        Ok(())
    }

    pub fn sensor_record(&self, snapshot: &SensorSnapshot) -> SensorRecord {
        let params = snapshot.params;
        SensorRecord {
            transform: self.layout.to_wire(&snapshot.transform),
            depth: params.depth,
            height: params.height,
            radius: params.radius,
            sample_stride: params.stride,
            total_samples: params.total_samples(),
        }
    }

    /// Runs one boundary call and reports it as failed if it outlived the timeout.
    ///
    /// The engine call itself cannot be interrupted; the bound is checked once it
    /// returns.
    pub fn bounded<T>(&self, call: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let started = Instant::now();
        let result = f();
        let elapsed = started.elapsed();

        if let Some(limit) = self.timeout {
            if elapsed > limit {
                log::error!(
                    "Engine call `{}` took {:?}, over the {:?} bound",
                    call,
                    elapsed,
                    limit
                );
                return Err(RaySyncError::EngineTimeout {
                    call,
                    elapsed,
                    limit,
                });
            }
        }

        result.map_err(|e| {
            log::error!("Engine call `{}` failed: {}", call, e);
            e
        })
    }

    fn check_indices(&self, indices: &[u32]) -> Result<()> {
        match indices
            .iter()
            .find(|&&index| index as usize >= self.object_count)
        {
            Some(&index) => Err(RaySyncError::InvalidIndex {
                index,
                count: self.object_count,
            }),
            None => Ok(()),
        }
    }
}
