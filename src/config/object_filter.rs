use crate::scene::SceneObject;

/// Selects which objects from an [`ObjectSource`](crate::scene::ObjectSource) are
/// mirrored into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFilter {
    /// Bit `n` set means objects on layer `n` are accepted
    pub layer_mask: u32,
    /// When set and non-empty, only objects carrying exactly this tag are accepted
    pub tag: Option<String>,
}

impl Default for ObjectFilter {
    fn default() -> Self {
        Self {
            layer_mask: u32::MAX,
            tag: None,
        }
    }
}

impl ObjectFilter {
    pub fn with_layer_mask(mut self, layer_mask: u32) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn accepts(&self, object: &SceneObject) -> bool {
        if self.layer_mask & (1u32 << object.layer()) == 0 {
            return false;
        }

        match self.tag.as_deref() {
            Some(tag) if !tag.is_empty() => object.tag() == Some(tag),
            _ => true,
        }
    }
}
