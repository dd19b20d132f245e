//! Single-shot ray queries and batched sensor fires.
//!
//! These functions talk to the engine directly and assume the caller has already
//! flushed pending scene deltas. [`RaySyncWorld`](crate::RaySyncWorld) does that
//! before every call; use it rather than these unless you drive the sync yourself.

mod hit_buffer;

pub use hit_buffer::HitBuffer;

use crate::backend::RayEngine;
use crate::error::{RaySyncError, Result};
use crate::math::Vec3;
use crate::sync::SyncProtocol;

fn check_ray(direction: Vec3, max_distance: f32) -> Result<()> {
    if !direction.is_finite() || direction.length_squared() == 0.0 {
        return Err(RaySyncError::Configuration(format!(
            "ray direction must be finite and non-zero, got {}",
            direction
        )));
    }
    if max_distance.is_nan() || max_distance <= 0.0 {
        return Err(RaySyncError::Configuration(format!(
            "ray max distance must be positive, got {}",
            max_distance
        )));
    }
    Ok(())
}

/// Whether anything lies within `max_distance` of `origin` along `direction`.
pub fn cast_ray<E: RayEngine + ?Sized>(
    engine: &mut E,
    protocol: &SyncProtocol,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Result<bool> {
    check_ray(direction, max_distance)?;
    let direction = direction.normalize();
    protocol.bounded("cast_ray", || engine.cast_ray(origin, direction, max_distance))
}

/// Closest hit point along the ray.
///
/// The engine answers "no hit" with the zero vector, so a genuine hit exactly at
/// the world origin is also reported as `None`.
pub fn cast_ray_hit_point<E: RayEngine + ?Sized>(
    engine: &mut E,
    protocol: &SyncProtocol,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Result<Option<Vec3>> {
    check_ray(direction, max_distance)?;
    let direction = direction.normalize();
    let point = protocol.bounded("cast_ray_hit", || {
        engine.cast_ray_hit(origin, direction, max_distance)
    })?;
    Ok((point != Vec3::ZERO).then_some(point))
}

/// Fires the engine's current sensor set and returns only the hit count.
pub fn fire_sensors_count<E: RayEngine + ?Sized>(
    engine: &mut E,
    protocol: &SyncProtocol,
) -> Result<usize> {
    protocol.bounded("fire_sensors_count", || engine.fire_sensors_count())
}

/// Fires the engine's current sensor set and lends out the result buffer.
///
/// If the fire outlives the boundary timeout the buffer is released before the
/// error is returned.
pub fn fire_sensors_positions<'e, E: RayEngine + ?Sized>(
    engine: &'e mut E,
    protocol: &SyncProtocol,
) -> Result<HitBuffer<'e, E>> {
    let started = std::time::Instant::now();
    let raw = engine.fire_sensors().map_err(|e| {
        log::error!("Engine call `fire_sensors` failed: {}", e);
        e
    })?;
    let elapsed = started.elapsed();
    let buffer = HitBuffer::new(engine, raw);

    if let Some(limit) = protocol.timeout() {
        if elapsed > limit {
            log::error!(
                "Engine call `fire_sensors` took {:?}, over the {:?} bound",
                elapsed,
                limit
            );
            drop(buffer);
            return Err(RaySyncError::EngineTimeout {
                call: "fire_sensors",
                elapsed,
                limit,
            });
        }
    }

    Ok(buffer)
}
