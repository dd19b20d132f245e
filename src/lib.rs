//! # RaySync
//!
//! Keeps a native ray-intersection engine in step with a dynamic 3D scene and drives
//! virtual sensors (lidar-style ray grids) against it.
//!
//! The host owns its scene: mesh instances with shared vertex buffers and movable
//! transforms, plus a set of sensors. RaySync mirrors that scene into the engine's
//! parallel arrays once, then sends only what changed: moved objects, objects that
//! crossed the distance-culling threshold, and the sensor set whenever any sensor
//! moved or was reconfigured.
//!
//! ## Quick Start
//!
//! ```no_run
//! use raysync::*;
//! use raysync::math::{Mat4, Vec3};
//! use std::sync::Arc;
//!
//! // Build a scene
//! let mut scene = SceneCollection::new();
//! let vertices: Arc<[Vec3]> = Arc::from(vec![
//!     Vec3::new(-1.0, -1.0, 0.0),
//!     Vec3::new(1.0, -1.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//! ]);
//! let wall = scene.add(SceneObject::new(
//!     "wall",
//!     vertices,
//!     Mat4::from_translation(Vec3::new(0.0, 0.0, 8.0)),
//! ));
//!
//! // Register it with an engine
//! let mut world = RaySyncWorld::new(RaySyncDesc::default(), SoftwareEngine::new())?;
//! world.register_objects(&scene)?;
//!
//! // Single-shot queries always see the latest transforms
//! wall.transform().set_position(Vec3::new(0.0, 0.0, 6.0));
//! let hit = world.cast_ray_hit_point(Vec3::ZERO, Vec3::Z, 20.0)?;
//!
//! // Run sensors continuously and collect their hits
//! let sensor = Sensor::new("front", Mat4::IDENTITY, SensorParams::default())?.into_shared();
//! let mut engine = RaySyncEngine::new(world);
//! engine.start_continuous(vec![sensor], |points: &[Vec3]| {
//!     println!("{} hit points", points.len());
//! })?;
//!
//! for event in engine.poll_events() {
//!     if let RaySyncEvent::TickFailed { error, .. } = event {
//!         eprintln!("tick failed: {}", error);
//!     }
//! }
//! engine.stop();
//! # let _ = hit;
//! # Ok::<(), RaySyncError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`RaySyncWorld`]**: owns the engine; registration, sync and queries
//! - **[`RaySyncEngine`]**: the continuous tick loop on its own thread
//! - **[`RaySyncDesc`]**: tick rate, distance culling, object filter, call timeout
//! - **[`RayEngine`]**: the boundary trait a native engine implements
//! - **[`HitBuffer`]**: scoped access to an engine-owned hit buffer
//! - **[`HitPointConsumer`]** / **[`PointCloud`]**: where tick results go
//! - **[`RaySyncEvent`]**: session transitions, deliveries and tick failures
//!
//! ## Known limitations
//!
//! - Objects cannot be added or removed after registration; shut the world down
//!   and register the whole set again.
//! - A failed sync or fire is not retried. The changes behind it are only resent
//!   if the affected objects or sensors change again.

pub mod backend;
pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod events;
pub mod math;
pub mod query;
pub mod scene;
pub mod sync;
pub mod world;

pub use backend::{RayEngine, SoftwareEngine};
pub use config::{ObjectFilter, RaySyncDesc};
pub use consumer::{HitPointConsumer, PointCloud};
pub use engine::{DEFAULT_EVENT_CAPACITY, RaySyncEngine, SessionState};
pub use error::RaySyncError;
pub use events::RaySyncEvent;
pub use query::HitBuffer;
pub use scene::{ObjectSource, SceneCollection, SceneObject, Sensor, SensorParams, TrackedTransform};
pub use world::{RaySyncWorld, TickOutcome};
