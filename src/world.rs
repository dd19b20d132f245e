use crate::backend::RayEngine;
use crate::config::RaySyncDesc;
use crate::consumer::HitPointConsumer;
use crate::error::{RaySyncError, Result};
use crate::math::Vec3;
use crate::query::{self, HitBuffer};
use crate::scene::{ObjectSource, Sensor, collect_objects};
use crate::sync::{DistanceCulling, ObjectRegistry, SensorRegistry, SyncProtocol, SyncStats};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// What a single [`RaySyncWorld::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed since the last fire, so the sensors were not fired
    Skipped,
    /// The sensors fired and the consumer received `count` points
    Fired { count: usize },
}

/// The host-side mirror of a native ray-intersection engine.
///
/// `RaySyncWorld` owns the engine and keeps it in step with the host scene: objects
/// are registered once, after which only moved objects and enabled-flag flips are
/// sent; the sensor set is resent whole whenever any sensor changes.
///
/// # Sync before query
///
/// Every query method flushes pending object and sensor changes first, so answers
/// always reflect the current host scene.
///
/// # Threading
///
/// The world is `Send` but not shared. The continuous loop in
/// [`RaySyncEngine`](crate::RaySyncEngine) wraps it in a mutex and holds the lock
/// for one whole tick.
pub struct RaySyncWorld {
    desc: RaySyncDesc,
    engine: Box<dyn RayEngine>,
    objects: ObjectRegistry,
    sensors: SensorRegistry,
    protocol: SyncProtocol,
    /// Set whenever changes cross the boundary; the next tick fires only if set
    pending_fire: bool,
    /// Whether the engine may hold scene or sensor state that shutdown must drop
    engine_retains_state: bool,
}

impl RaySyncWorld {
    /// Creates a world around `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`RaySyncError::Configuration`] if `desc` does not validate.
    pub fn new<E: RayEngine + 'static>(desc: RaySyncDesc, engine: E) -> Result<Self> {
        Self::with_boxed_engine(desc, Box::new(engine))
    }

    pub fn with_boxed_engine(desc: RaySyncDesc, engine: Box<dyn RayEngine>) -> Result<Self> {
        desc.validate()?;

        let culling = DistanceCulling::new(desc.origin.clone(), desc.max_distance_from_origin);
        let protocol = SyncProtocol::new(engine.transform_layout(), desc.boundary_timeout);

        Ok(Self {
            desc,
            engine,
            objects: ObjectRegistry::new(culling),
            sensors: SensorRegistry::new(),
            protocol,
            pending_fire: false,
            engine_retains_state: false,
        })
    }

    pub fn desc(&self) -> &RaySyncDesc {
        &self.desc
    }

    /// Registers every object from `source` that passes the configured filter.
    ///
    /// Indices are assigned in source order and the whole set is sent to the engine
    /// in one call. Adding or removing objects later requires [`shutdown`] and a new
    /// registration.
    ///
    /// # Returns
    ///
    /// The number of registered objects. Zero is not an error, but nothing is sent
    /// and a continuous session will refuse to start.
    ///
    /// # Errors
    ///
    /// - [`RaySyncError::AlreadyInitialized`] if objects are already registered
    /// - any engine failure from the full-scene push; the registration is rolled back
    ///
    /// [`shutdown`]: Self::shutdown
    pub fn register_objects(&mut self, source: &dyn ObjectSource) -> Result<usize> {
        if self.protocol.is_initialized() {
            return Err(RaySyncError::AlreadyInitialized);
        }

        let objects = collect_objects(source, &self.desc.object_filter);
        if objects.is_empty() {
            log::warn!("No scene objects matched the registration filter; nothing registered");
            return Ok(0);
        }

        let count = self.objects.register(objects)?;
        self.engine_retains_state = true;
        if let Err(e) = self
            .protocol
            .push_full_scene(self.engine.as_mut(), self.objects.entries())
        {
            self.objects.clear();
            return Err(e);
        }

        self.pending_fire = true;
        Ok(count)
    }

    /// Replaces the active sensor set. It is sent on the next sync.
    ///
    /// # Errors
    ///
    /// Returns [`RaySyncError::NoSensors`] if `sensors` is empty.
    pub fn set_sensors(&mut self, sensors: Vec<Arc<Sensor>>) -> Result<()> {
        if sensors.is_empty() {
            log::warn!("Refusing to replace the sensor set with an empty one");
            return Err(RaySyncError::NoSensors);
        }

        self.sensors.set_sensors(sensors);
        Ok(())
    }

    /// Sends pending object moves and enabled flips.
    ///
    /// Change flags are consumed before the push, so a failed push is not retried
    /// unless the object changes again. Does nothing before registration.
    ///
    /// # Returns
    ///
    /// `true` if anything was sent.
    pub fn flush_objects(&mut self) -> Result<bool> {
        if !self.protocol.is_initialized() {
            return Ok(false);
        }

        let delta = self.objects.evaluate();
        let pushed = self
            .protocol
            .push_object_deltas(self.engine.as_mut(), &delta)?;
        if pushed {
            log::trace!(
                "Synced {} enabled flips and {} transforms",
                delta.enabled.indices.len(),
                delta.transforms.indices.len()
            );
            self.pending_fire = true;
        }
        Ok(pushed)
    }

    /// Resends the whole sensor set if any sensor changed.
    pub fn flush_sensors(&mut self) -> Result<bool> {
        let Some(snapshots) = self.sensors.evaluate() else {
            return Ok(false);
        };

        self.engine_retains_state = true;
        self.protocol
            .push_sensor_set(self.engine.as_mut(), &snapshots)?;
        self.pending_fire = true;
        Ok(true)
    }

    /// Flushes objects, then sensors. Returns `true` if anything was sent.
    ///
    /// The sensor flush runs even when the object flush fails, so both sets of
    /// change flags are consumed; the first error is returned.
    pub fn sync(&mut self) -> Result<bool> {
        let objects = self.flush_objects();
        let sensors = self.flush_sensors();
        Ok(objects? | sensors?)
    }

    /// Whether anything lies within `max_distance` of `origin` along `direction`.
    pub fn cast_ray(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Result<bool> {
        self.sync()?;
        query::cast_ray(
            self.engine.as_mut(),
            &self.protocol,
            origin,
            direction,
            max_distance,
        )
    }

    /// Closest hit point along a ray, or `None` on a miss.
    ///
    /// The engine reports a miss as the zero vector. A real hit exactly at the world
    /// origin is indistinguishable from that and also comes back as `None`.
    pub fn cast_ray_hit_point(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Result<Option<Vec3>> {
        self.sync()?;
        query::cast_ray_hit_point(
            self.engine.as_mut(),
            &self.protocol,
            origin,
            direction,
            max_distance,
        )
    }

    /// Replaces the sensor set with `sensors`, fires it and returns the hit count.
    ///
    /// # Errors
    ///
    /// Returns [`RaySyncError::NoSensors`] if `sensors` is empty.
    pub fn fire_sensors_count(&mut self, sensors: Vec<Arc<Sensor>>) -> Result<usize> {
        self.set_sensors(sensors)?;
        self.sync()?;
        query::fire_sensors_count(self.engine.as_mut(), &self.protocol)
    }

    /// Fires the current sensor set and lends out the hit buffer.
    ///
    /// The buffer keeps the world borrowed until it is dropped or released, which is
    /// when the engine frees it. Copy the points out first.
    ///
    /// # Errors
    ///
    /// Returns [`RaySyncError::NoSensors`] if no sensor set has been configured.
    pub fn fire_sensors_positions(&mut self) -> Result<HitBuffer<'_, dyn RayEngine>> {
        if self.sensors.is_empty() {
            log::warn!("fire_sensors_positions called with no sensors configured");
            return Err(RaySyncError::NoSensors);
        }

        self.sync()?;
        query::fire_sensors_positions(self.engine.as_mut(), &self.protocol)
    }

    /// One step of the continuous loop: sync, and if anything changed since the
    /// last fire, fire the sensors and hand the points to `consumer`.
    ///
    /// The hit buffer is released before this returns. A panicking consumer is
    /// caught and reported as [`RaySyncError::ConsumerPanicked`], so the world stays
    /// usable. An engine failure aborts the tick; the changes that triggered it are
    /// not resent.
    ///
    /// # Errors
    ///
    /// - [`RaySyncError::NoTargets`] if no objects are registered
    /// - [`RaySyncError::NoSensors`] if no sensor set is configured
    /// - [`RaySyncError::ConsumerPanicked`] if `consumer` panicked
    /// - any engine failure during sync or fire
    pub fn tick(&mut self, consumer: &mut dyn HitPointConsumer) -> Result<TickOutcome> {
        if !self.protocol.is_initialized() {
            return Err(RaySyncError::NoTargets);
        }
        if self.sensors.is_empty() {
            return Err(RaySyncError::NoSensors);
        }

        self.sync()?;
        if !self.pending_fire {
            return Ok(TickOutcome::Skipped);
        }
        self.pending_fire = false;

        let buffer = query::fire_sensors_positions(self.engine.as_mut(), &self.protocol)?;
        let count = buffer.len();
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
            consumer.on_hit_points(buffer.points())
        }));
        buffer.release();

        if let Err(payload) = delivered {
            let message = panic_message(payload.as_ref());
            log::error!("Hit-point consumer panicked: {}", message);
            return Err(RaySyncError::ConsumerPanicked(message));
        }

        Ok(TickOutcome::Fired { count })
    }

    /// Forwards elapsed wall time to the engine.
    pub fn advance_time(&mut self, seconds: f32) {
        self.engine.advance_time(seconds);
    }

    /// Tells the engine to drop all retained state and forgets the registration.
    ///
    /// Objects and sensors can be registered again afterwards.
    pub fn shutdown(&mut self) {
        if !self.engine_retains_state {
            return;
        }

        self.engine.shutdown();
        self.objects.clear();
        self.sensors.clear();
        self.protocol.reset();
        self.pending_fire = false;
        self.engine_retains_state = false;
        log::info!("Engine state released");
    }

    /// Whether objects have been registered with the engine.
    pub fn is_initialized(&self) -> bool {
        self.protocol.is_initialized()
    }

    pub fn object_count(&self) -> usize {
        self.protocol.object_count()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn sensors(&self) -> &[Arc<Sensor>] {
        self.sensors.sensors()
    }

    pub fn stats(&self) -> SyncStats {
        self.protocol.stats()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Drop for RaySyncWorld {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for RaySyncWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaySyncWorld")
            .field("objects", &self.object_count())
            .field("sensors", &self.sensor_count())
            .field("pending_fire", &self.pending_fire)
            .finish_non_exhaustive()
    }
}
