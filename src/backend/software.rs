use crate::backend::sensor_rays::build_rays;
use crate::backend::{BufferHandle, ObjectRecord, RawHits, RayEngine, SensorRecord};
use crate::error::{RaySyncError, Result};
use crate::math::{Mat4, Ray, TransformLayout, Vec3, WireMatrix};
use std::collections::HashMap;

/// Triangle in world space, stored as one vertex plus two edges.
#[derive(Debug, Clone, Copy)]
struct Triangle {
    v0: Vec3,
    e1: Vec3,
    e2: Vec3,
}

impl Triangle {
    fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            v0: a,
            e1: b - a,
            e2: c - a,
        }
    }

    /// Möller–Trumbore. Returns the ray parameter of the hit, if any.
    fn intersect(&self, ray: &Ray) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let p = ray.direction.cross(self.e2);
        let det = self.e1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.e1);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = self.e2.dot(q) * inv_det;
        (t > EPSILON && t <= ray.max_distance).then_some(t)
    }
}

#[derive(Debug)]
struct Mesh {
    local_vertices: Vec<Vec3>,
    transform: Mat4,
    enabled: bool,
    triangles: Vec<Triangle>,
}

impl Mesh {
    fn new(local_vertices: Vec<Vec3>, transform: Mat4, enabled: bool) -> Self {
        let mut mesh = Self {
            local_vertices,
            transform,
            enabled,
            triangles: Vec::new(),
        };
        mesh.rebuild();
        mesh
    }

    fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let transform = self.transform;
        self.triangles = self
            .local_vertices
            .chunks_exact(3)
            .map(|tri| {
                Triangle::new(
                    transform.transform_point3(tri[0]),
                    transform.transform_point3(tri[1]),
                    transform.transform_point3(tri[2]),
                )
            })
            .collect();
    }
}

/// CPU reference engine.
///
/// Brute-force intersection against every enabled triangle, with no acceleration
/// structure. Geometry is copied out of the registration call, so the host's vertex
/// buffers are not touched afterwards.
#[derive(Debug)]
pub struct SoftwareEngine {
    layout: TransformLayout,
    meshes: Vec<Mesh>,
    sensors: Vec<SensorRecord>,
    rays: Vec<Ray>,
    buffers: HashMap<u64, Vec<Vec3>>,
    next_handle: u64,
    time: f32,
}

impl Default for SoftwareEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareEngine {
    pub fn new() -> Self {
        Self::with_layout(TransformLayout::ColumnMajor)
    }

    /// Engine that expects matrices in `layout`.
    pub fn with_layout(layout: TransformLayout) -> Self {
        Self {
            layout,
            meshes: Vec::new(),
            sensors: Vec::new(),
            rays: Vec::new(),
            buffers: HashMap::new(),
            next_handle: 1,
            time: 0.0,
        }
    }

    pub fn object_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn ray_count(&self) -> usize {
        self.rays.len()
    }

    /// Hit buffers handed out and not yet released.
    pub fn outstanding_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_enabled(&self, index: usize) -> Option<bool> {
        self.meshes.get(index).map(|mesh| mesh.enabled)
    }

    pub fn transform(&self, index: usize) -> Option<Mat4> {
        self.meshes.get(index).map(|mesh| mesh.transform)
    }

    fn closest_hit(&self, ray: &Ray) -> Option<f32> {
        self.meshes
            .iter()
            .filter(|mesh| mesh.enabled)
            .flat_map(|mesh| mesh.triangles.iter())
            .filter_map(|triangle| triangle.intersect(ray))
            .min_by(f32::total_cmp)
    }

    fn mesh_mut(&mut self, index: u32) -> Result<&mut Mesh> {
        let count = self.meshes.len();
        self.meshes
            .get_mut(index as usize)
            .ok_or(RaySyncError::InvalidIndex { index, count })
    }

    fn trace_sensors(&self) -> Vec<Vec3> {
        self.rays
            .iter()
            .filter_map(|ray| self.closest_hit(ray).map(|t| ray.at(t)))
            .collect()
    }
}

// SAFETY: hit buffers live in `self.buffers` until their handle is released. The
// map owns each `Vec`, so its heap allocation does not move when the map rehashes,
// and nothing mutates a stored buffer.
unsafe impl RayEngine for SoftwareEngine {
    fn transform_layout(&self) -> TransformLayout {
        self.layout
    }

    fn initialize_objects(&mut self, objects: &[ObjectRecord<'_>]) -> Result<()> {
        self.meshes = objects
            .iter()
            .map(|record| {
                if record.vertex_count() % 3 != 0 {
                    log::warn!(
                        "Mesh with {} vertices is not a triangle list; trailing vertices ignored",
                        record.vertex_count()
                    );
                }
                Mesh::new(
                    record.vertices.to_vec(),
                    self.layout.from_wire(&record.transform),
                    record.enabled != 0,
                )
            })
            .collect();
        log::debug!("Software engine holds {} meshes", self.meshes.len());
        Ok(())
    }

    fn update_enabled(&mut self, indices: &[u32], values: &[i32]) -> Result<()> {
        if indices.len() != values.len() {
            return Err(RaySyncError::EngineCommunication(format!(
                "update_enabled got {} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        for (&index, &value) in indices.iter().zip(values) {
            self.mesh_mut(index)?.enabled = value != 0;
        }
        Ok(())
    }

    fn update_transforms(&mut self, indices: &[u32], matrices: &[WireMatrix]) -> Result<()> {
        if indices.len() != matrices.len() {
            return Err(RaySyncError::EngineCommunication(format!(
                "update_transforms got {} indices but {} matrices",
                indices.len(),
                matrices.len()
            )));
        }
        let layout = self.layout;
        for (&index, matrix) in indices.iter().zip(matrices) {
            self.mesh_mut(index)?.set_transform(layout.from_wire(matrix));
        }
        Ok(())
    }

    fn set_sensors(&mut self, sensors: &[SensorRecord]) -> Result<()> {
        self.sensors = sensors.to_vec();
        self.rays = build_rays(&self.sensors, self.layout);
        log::debug!(
            "Software engine generated {} rays for {} sensors",
            self.rays.len(),
            self.sensors.len()
        );
        Ok(())
    }

    fn cast_ray(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Result<bool> {
        let ray = Ray::new(origin, direction.normalize_or_zero(), max_distance);
        Ok(self.closest_hit(&ray).is_some())
    }

    fn cast_ray_hit(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Result<Vec3> {
        let ray = Ray::new(origin, direction.normalize_or_zero(), max_distance);
        Ok(self
            .closest_hit(&ray)
            .map(|t| ray.at(t))
            .unwrap_or(Vec3::ZERO))
    }

    fn fire_sensors_count(&mut self) -> Result<usize> {
        Ok(self
            .rays
            .iter()
            .filter(|ray| self.closest_hit(ray).is_some())
            .count())
    }

    fn fire_sensors(&mut self) -> Result<RawHits> {
        let hits = self.trace_sensors();
        let handle = self.next_handle;
        self.next_handle += 1;

        let count = hits.len();
        let points = if count == 0 {
            std::ptr::null()
        } else {
            hits.as_ptr()
        };
        self.buffers.insert(handle, hits);

        Ok(RawHits {
            handle: BufferHandle::new(handle),
            points,
            count,
        })
    }

    fn release(&mut self, handle: BufferHandle) -> bool {
        self.buffers.remove(&handle.raw()).is_some()
    }

    fn advance_time(&mut self, seconds: f32) {
        self.time = seconds;
    }

    fn shutdown(&mut self) {
        if !self.buffers.is_empty() {
            log::warn!(
                "Software engine shut down with {} unreleased hit buffers",
                self.buffers.len()
            );
        }
        self.meshes.clear();
        self.sensors.clear();
        self.rays.clear();
        self.buffers.clear();
    }
}

/// Two triangles forming an axis-aligned unit quad in the XY plane.
#[cfg(test)]
pub(crate) fn unit_quad() -> Vec<Vec3> {
    vec![
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.0),
        Vec3::new(0.5, 0.5, 0.0),
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, 0.5, 0.0),
        Vec3::new(-0.5, 0.5, 0.0),
    ]
}
