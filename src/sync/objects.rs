use crate::error::{RaySyncError, Result};
use crate::math::{Mat4, Vec3};
use crate::scene::{SceneObject, TransformHandle};
use std::sync::Arc;

/// Distance culling around an optional origin.
///
/// With no origin every object is enabled. Otherwise an object is enabled while it
/// is strictly closer than `max_distance`.
#[derive(Debug, Clone)]
pub struct DistanceCulling {
    origin: Option<TransformHandle>,
    max_distance: f32,
}

impl DistanceCulling {
    pub fn new(origin: Option<TransformHandle>, max_distance: f32) -> Self {
        Self {
            origin,
            max_distance,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, f32::INFINITY)
    }

    pub fn is_enabled(&self, position: Vec3) -> bool {
        match &self.origin {
            None => true,
            Some(origin) => position.distance(origin.position()) < self.max_distance,
        }
    }
}

/// One registered object with its last-sent enabled state.
#[derive(Debug)]
pub struct ObjectEntry {
    object: Arc<SceneObject>,
    enabled: bool,
}

impl ObjectEntry {
    pub fn object(&self) -> &SceneObject {
        &self.object
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Objects whose enabled flag flipped, as parallel lists.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnabledDelta {
    pub indices: Vec<u32>,
    pub values: Vec<bool>,
}

/// Objects that moved, as parallel lists.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransformDelta {
    pub indices: Vec<u32>,
    pub matrices: Vec<Mat4>,
}

/// Everything that changed on the object side since the last evaluation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ObjectDelta {
    pub enabled: EnabledDelta,
    pub transforms: TransformDelta,
}

impl ObjectDelta {
    pub fn is_empty(&self) -> bool {
        self.enabled.indices.is_empty() && self.transforms.indices.is_empty()
    }
}

/// Mirror of the engine's object arrays.
///
/// Indices are positions in the registration list. They are assigned once by
/// [`register`](Self::register) and never reused or compacted; adding or removing an
/// object means clearing the registry and registering the whole set again.
#[derive(Debug)]
pub struct ObjectRegistry {
    entries: Vec<ObjectEntry>,
    culling: DistanceCulling,
    registered: bool,
}

impl ObjectRegistry {
    pub fn new(culling: DistanceCulling) -> Self {
        Self {
            entries: Vec::new(),
            culling,
            registered: false,
        }
    }

    /// Assigns indices in list order and snapshots the initial state.
    ///
    /// The transforms' change flags are cleared: the registration push already
    /// carries the current matrices.
    pub fn register(&mut self, objects: Vec<Arc<SceneObject>>) -> Result<usize> {
        if self.registered {
            return Err(RaySyncError::AlreadyInitialized);
        }
        if objects.len() > u32::MAX as usize {
            return Err(RaySyncError::Configuration(format!(
                "{} objects exceed the engine's index range",
                objects.len()
            )));
        }

        self.entries = objects
            .into_iter()
            .map(|object| {
                object.transform().take_changed();
                let enabled = self.culling.is_enabled(object.transform().position());
                ObjectEntry { object, enabled }
            })
            .collect();
        self.registered = true;
        Ok(self.entries.len())
    }

    /// Forgets every entry so the set can be registered again.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.registered = false;
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ObjectEntry] {
        &self.entries
    }

    /// Collects enabled flips and moves since the last call.
    ///
    /// Reading consumes the state: a second call with no motion in between returns
    /// an empty delta.
    pub fn evaluate(&mut self) -> ObjectDelta {
        let mut delta = ObjectDelta::default();

        for (index, entry) in self.entries.iter_mut().enumerate() {
            let index = index as u32;
            let transform = entry.object.transform();

            let enabled = self.culling.is_enabled(transform.position());
            if enabled != entry.enabled {
                entry.enabled = enabled;
                delta.enabled.indices.push(index);
                delta.enabled.values.push(enabled);
            }

            if transform.take_changed() {
                delta.transforms.indices.push(index);
                delta.transforms.matrices.push(transform.matrix());
            }
        }

        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TrackedTransform;

    fn object_at(position: Vec3) -> Arc<SceneObject> {
        let vertices: Arc<[Vec3]> = Arc::from(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        SceneObject::new("o", vertices, Mat4::from_translation(position)).into_shared()
    }

    #[test]
    fn test_moving_one_object_reports_its_index() {
        let objects: Vec<_> = (0..3)
            .map(|i| object_at(Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        let mut registry = ObjectRegistry::new(DistanceCulling::disabled());
        assert_eq!(registry.register(objects.clone()).unwrap(), 3);

        assert!(registry.evaluate().is_empty());

        objects[1].transform().set_position(Vec3::new(1.0, 5.0, 0.0));
        let delta = registry.evaluate();
        assert_eq!(delta.transforms.indices, vec![1]);
        assert_eq!(delta.transforms.matrices.len(), 1);
        assert_eq!(
            delta.transforms.matrices[0],
            Mat4::from_translation(Vec3::new(1.0, 5.0, 0.0))
        );
        assert!(delta.enabled.indices.is_empty());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let objects = vec![object_at(Vec3::ZERO), object_at(Vec3::X)];
        let mut registry = ObjectRegistry::new(DistanceCulling::disabled());
        registry.register(objects.clone()).unwrap();

        objects[0].transform().set_position(Vec3::Y);
        objects[1].transform().set_position(Vec3::Z);
        assert_eq!(registry.evaluate().transforms.indices, vec![0, 1]);
        assert!(registry.evaluate().is_empty());
    }

    #[test]
    fn test_enabled_boundary_is_exclusive() {
        let origin = Arc::new(TrackedTransform::default());
        let culling = DistanceCulling::new(Some(origin), 10.0);

        assert!(culling.is_enabled(Vec3::new(9.999, 0.0, 0.0)));
        assert!(!culling.is_enabled(Vec3::new(10.0, 0.0, 0.0)));
        assert!(!culling.is_enabled(Vec3::new(0.0, -25.0, 0.0)));
        assert!(DistanceCulling::disabled().is_enabled(Vec3::splat(1e30)));
    }

    #[test]
    fn test_enabled_delta_follows_origin() {
        let origin = Arc::new(TrackedTransform::default());
        let near = object_at(Vec3::new(5.0, 0.0, 0.0));
        let far = object_at(Vec3::new(50.0, 0.0, 0.0));

        let mut registry =
            ObjectRegistry::new(DistanceCulling::new(Some(origin.clone()), 10.0));
        registry.register(vec![near, far]).unwrap();
        assert!(registry.entries()[0].enabled());
        assert!(!registry.entries()[1].enabled());

        // Moving the origin is not an object move, but it flips both flags.
        origin.set_position(Vec3::new(48.0, 0.0, 0.0));
        let delta = registry.evaluate();
        assert_eq!(delta.enabled.indices, vec![0, 1]);
        assert_eq!(delta.enabled.values, vec![false, true]);
        assert!(delta.transforms.indices.is_empty());

        assert!(registry.evaluate().is_empty());
    }

    #[test]
    fn test_register_only_once() {
        let mut registry = ObjectRegistry::new(DistanceCulling::disabled());
        registry.register(vec![object_at(Vec3::ZERO)]).unwrap();
        assert!(matches!(
            registry.register(vec![object_at(Vec3::ZERO)]),
            Err(RaySyncError::AlreadyInitialized)
        ));

        registry.clear();
        assert_eq!(registry.register(vec![]).unwrap(), 0);
        assert!(registry.is_registered());
        assert!(registry.evaluate().is_empty());
    }

    #[test]
    fn test_registration_clears_pending_moves() {
        let object = object_at(Vec3::ZERO);
        object.transform().set_position(Vec3::X);

        let mut registry = ObjectRegistry::new(DistanceCulling::disabled());
        registry.register(vec![object]).unwrap();
        assert!(registry.evaluate().is_empty());
    }
}
