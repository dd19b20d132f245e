use crate::config::ObjectFilter;
use crate::math::{Mat4, Vec3};
use crate::scene::transform::TrackedTransform;
use std::sync::Arc;

/// A mesh instance owned by the host scene.
///
/// The vertex buffer is shared, never copied by the sync layer: registration only
/// lends a slice of it to the engine for the duration of the initial push.
/// Vertices are a triangle list, three per face.
#[derive(Debug)]
pub struct SceneObject {
    name: String,
    vertices: Arc<[Vec3]>,
    transform: TrackedTransform,
    layer: u8,
    tag: Option<String>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, vertices: Arc<[Vec3]>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            vertices,
            transform: TrackedTransform::new(transform),
            layer: 0,
            tag: None,
        }
    }

    /// Places the object on a layer (0..=31). Out-of-range layers are clamped to 31.
    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer.min(31);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn transform(&self) -> &TrackedTransform {
        &self.transform
    }

    pub fn layer(&self) -> u8 {
        self.layer
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

/// Supplies the objects a world mirrors into the engine.
///
/// Discovery is up to the host (walking a scene graph, an ECS query, a level
/// file). The world calls this once per registration and keeps the returned
/// order as the engine index order.
pub trait ObjectSource {
    fn objects(&self) -> Vec<Arc<SceneObject>>;
}

/// Plain in-memory object source.
#[derive(Debug, Default, Clone)]
pub struct SceneCollection {
    objects: Vec<Arc<SceneObject>>,
}

impl SceneCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: SceneObject) -> Arc<SceneObject> {
        let shared = object.into_shared();
        self.objects.push(shared.clone());
        shared
    }

    pub fn push(&mut self, object: Arc<SceneObject>) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectSource for SceneCollection {
    fn objects(&self) -> Vec<Arc<SceneObject>> {
        self.objects.clone()
    }
}

impl ObjectSource for Vec<Arc<SceneObject>> {
    fn objects(&self) -> Vec<Arc<SceneObject>> {
        self.clone()
    }
}

/// Collects the objects from `source` that pass `filter`, preserving source order.
pub fn collect_objects(source: &dyn ObjectSource, filter: &ObjectFilter) -> Vec<Arc<SceneObject>> {
    source
        .objects()
        .into_iter()
        .filter(|object| filter.accepts(object))
        .collect()
}
