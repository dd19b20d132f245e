//! Ray-grid generation for sensors.
//!
//! A sensor looks along its local +Z axis. Its rays fan out horizontally over
//! `radius` degrees around world up, and step vertically over `height` units at the
//! far end of the field (`depth` along the fanned axis). Row and column counts are
//! the same as [`SensorParams::rows`](crate::scene::SensorParams::rows) and
//! [`SensorParams::columns`](crate::scene::SensorParams::columns), so one fire casts
//! exactly `total_samples` rays.

use crate::backend::SensorRecord;
use crate::math::{Quat, Ray, TransformLayout, Vec3, position_of};

/// Builds every ray for one sensor, appending them to `rays`.
pub fn append_sensor_rays(record: &SensorRecord, layout: TransformLayout, rays: &mut Vec<Ray>) {
    let matrix = layout.from_wire(&record.transform);
    let origin = position_of(&matrix);
    let forward = matrix.transform_vector3(Vec3::Z).normalize_or_zero();
    if forward == Vec3::ZERO {
        log::warn!("Sensor transform has no forward axis; skipping its rays");
        return;
    }

    let stride = record.sample_stride;
    let rows = (record.height / stride).ceil() as u32;
    let columns = (record.radius / stride).ceil() as u32;
    let reach = forward * record.depth;

    let total = u64::from(rows) * u64::from(columns);
    if total > u64::from(u32::MAX) {
        log::warn!("Sensor asks for {} rays per fire; skipping its rays", total);
        return;
    }
    rays.reserve(total as usize);
    for row in 0..rows {
        let rise = -record.height / 2.0 + row as f32 * stride;
        for column in 0..columns {
            let yaw = -record.radius / 2.0 + column as f32 * stride;
            let end = Quat::from_rotation_y(yaw.to_radians()) * reach + Vec3::Y * rise;
            let length = end.length();
            if length <= f32::EPSILON {
                continue;
            }
            rays.push(Ray::new(origin, end / length, length));
        }
    }
}

/// Builds the rays for a whole sensor set.
pub fn build_rays(sensors: &[SensorRecord], layout: TransformLayout) -> Vec<Ray> {
    let mut rays = Vec::new();
    for record in sensors {
        append_sensor_rays(record, layout, &mut rays);
    }
    rays
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat4;

    fn record(transform: Mat4, depth: f32, height: f32, radius: f32, stride: f32) -> SensorRecord {
        SensorRecord {
            transform: TransformLayout::ColumnMajor.to_wire(&transform),
            depth,
            height,
            radius,
            sample_stride: stride,
            total_samples: ((height / stride).ceil() * (radius / stride).ceil()) as u32,
        }
    }

    #[test]
    fn test_ray_count_matches_total_samples() {
        let sensor = record(Mat4::IDENTITY, 14.0, 10.0, 30.0, 0.2);
        let rays = build_rays(&[sensor], TransformLayout::ColumnMajor);
        assert_eq!(rays.len(), 7500);
        assert_eq!(rays.len() as u32, sensor.total_samples);
    }

    #[test]
    fn test_rays_start_at_sensor_and_face_forward() {
        let transform = Mat4::from_translation(Vec3::new(3.0, 1.0, -2.0));
        let sensor = record(transform, 10.0, 2.0, 20.0, 1.0);
        let rays = build_rays(&[sensor], TransformLayout::ColumnMajor);

        assert!(!rays.is_empty());
        for ray in &rays {
            assert_eq!(ray.origin, Vec3::new(3.0, 1.0, -2.0));
            assert!(ray.direction.z > 0.9);
            assert!((ray.direction.length() - 1.0).abs() < 1e-5);
            assert!(ray.max_distance >= 10.0);
        }
    }

    #[test]
    fn test_oversized_grid_is_skipped() {
        let dense = record(Mat4::IDENTITY, 14.0, 10.0, 30.0, 0.0001);
        let sparse = record(Mat4::IDENTITY, 5.0, 1.0, 1.0, 1.0);
        let rays = build_rays(&[dense, sparse], TransformLayout::ColumnMajor);
        assert_eq!(rays.len(), 1);
    }

    #[test]
    fn test_rotated_sensor_follows_its_forward_axis() {
        // Yawing +90 degrees about Y turns local +Z into world +X.
        let transform = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let sensor = record(transform, 5.0, 1.0, 1.0, 1.0);
        let rays = build_rays(&[sensor], TransformLayout::ColumnMajor);

        assert_eq!(rays.len(), 1);
        assert!(rays[0].direction.x > 0.9);
    }

    #[test]
    fn test_row_major_records_decode_the_same() {
        let transform = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let mut row_major = record(transform, 10.0, 1.0, 1.0, 1.0);
        row_major.transform = TransformLayout::RowMajor.to_wire(&transform);

        let rays = build_rays(&[row_major], TransformLayout::RowMajor);
        assert_eq!(rays[0].origin, Vec3::new(0.0, 5.0, 0.0));
    }
}
