//! Receivers for the hit points produced by each tick.

use crate::math::{Vec3, Vec4};

/// Receives the hit points of one sensor fire.
///
/// `points` borrows the engine's buffer and is released as soon as this returns.
/// Copy out whatever is needed; never keep the slice.
pub trait HitPointConsumer: Send {
    fn on_hit_points(&mut self, points: &[Vec3]);
}

impl<F> HitPointConsumer for F
where
    F: FnMut(&[Vec3]) + Send,
{
    fn on_hit_points(&mut self, points: &[Vec3]) {
        self(points)
    }
}

/// Indices per point instance (one quad, two triangles).
pub const POINT_INDEX_COUNT: u32 = 6;

/// CPU-side staging for a rendered point cloud.
///
/// Keeps the latest hit points as instance data (`xyz` position, `w` point size)
/// together with the indirect draw arguments a GPU renderer would upload. An empty
/// update leaves the previous frame's points in place.
#[derive(Debug, Clone)]
pub struct PointCloud {
    instances: Vec<Vec4>,
    point_size: f32,
    color: [f32; 4],
    updates: u64,
}

impl Default for PointCloud {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
            point_size: 0.05,
            color: [0.2, 0.9, 0.3, 1.0],
            updates: 0,
        }
    }
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn instances(&self) -> &[Vec4] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Non-empty updates received so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// `[index_count, instance_count, first_index, base_vertex, first_instance]`
    pub fn indirect_args(&self) -> [u32; 5] {
        [POINT_INDEX_COUNT, self.instances.len() as u32, 0, 0, 0]
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn update(&mut self, points: &[Vec3]) {
        if points.is_empty() {
            return;
        }

        self.instances.clear();
        self.instances
            .extend(points.iter().map(|p| p.extend(self.point_size)));
        self.updates += 1;
    }
}

impl HitPointConsumer for PointCloud {
    fn on_hit_points(&mut self, points: &[Vec3]) {
        self.update(points);
    }
}
