use crate::math::{Mat4, Vec3, position_of};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to a tracked world transform.
pub type TransformHandle = Arc<TrackedTransform>;

/// A world matrix owned by the host scene, plus a "moved since last read" flag.
///
/// The host writes through [`set_matrix`](Self::set_matrix) from any thread; the
/// sync side consumes the flag with [`take_changed`](Self::take_changed). Reading
/// the flag clears it, so a change is reported to exactly one reader.
#[derive(Debug)]
pub struct TrackedTransform {
    matrix: RwLock<Mat4>,
    changed: AtomicBool,
}

impl TrackedTransform {
    pub fn new(matrix: Mat4) -> Self {
        Self {
            matrix: RwLock::new(matrix),
            changed: AtomicBool::new(false),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(Mat4::from_translation(position))
    }

    pub fn shared(matrix: Mat4) -> TransformHandle {
        Arc::new(Self::new(matrix))
    }

    /// Current world matrix.
    pub fn matrix(&self) -> Mat4 {
        *self.matrix.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// World-space position (translation column).
    pub fn position(&self) -> Vec3 {
        position_of(&self.matrix())
    }

    /// Replaces the world matrix. Writing an identical matrix is not a move.
    pub fn set_matrix(&self, matrix: Mat4) {
        let mut current = self.matrix.write().unwrap_or_else(PoisonError::into_inner);
        if *current != matrix {
            *current = matrix;
            self.changed.store(true, Ordering::Release);
        }
    }

    /// Moves the transform, keeping its rotation and scale.
    pub fn set_position(&self, position: Vec3) {
        let mut current = self.matrix.write().unwrap_or_else(PoisonError::into_inner);
        let translation = position.extend(1.0);
        if current.w_axis != translation {
            current.w_axis = translation;
            self.changed.store(true, Ordering::Release);
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    /// Returns whether the transform moved since the last call, and clears the flag.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Flags the transform as moved without touching the matrix.
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }
}

impl Default for TrackedTransform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}
