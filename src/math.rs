//! Math types for RaySync

pub use glam::{Mat4, Quat, Vec3, Vec4};

/// A matrix as it crosses the engine boundary: 16 floats in the engine's layout.
pub type WireMatrix = [f32; 16];

/// Element order the engine expects for 4x4 matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformLayout {
    /// Columns stored contiguously (glam's native order).
    #[default]
    ColumnMajor,
    /// Rows stored contiguously.
    RowMajor,
}

impl TransformLayout {
    /// Flattens `matrix` into the order this layout describes.
    pub fn to_wire(self, matrix: &Mat4) -> WireMatrix {
        match self {
            Self::ColumnMajor => matrix.to_cols_array(),
            Self::RowMajor => matrix.transpose().to_cols_array(),
        }
    }

    /// Rebuilds a matrix from a wire array in this layout.
    pub fn from_wire(self, wire: &WireMatrix) -> Mat4 {
        match self {
            Self::ColumnMajor => Mat4::from_cols_array(wire),
            Self::RowMajor => Mat4::from_cols_array(wire).transpose(),
        }
    }
}

/// A single query ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Translation part of a world matrix.
pub fn position_of(matrix: &Mat4) -> Vec3 {
    matrix.w_axis.truncate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_wire_is_transposed() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let cols = TransformLayout::ColumnMajor.to_wire(&m);
        let rows = TransformLayout::RowMajor.to_wire(&m);

        // Translation sits in the last column: contiguous in column-major,
        // every fourth element in row-major.
        assert_eq!(&cols[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!([rows[3], rows[7], rows[11]], [1.0, 2.0, 3.0]);
        assert_eq!(TransformLayout::RowMajor.from_wire(&rows), m);
    }

    #[test]
    fn test_position_of() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(1.0),
            Vec3::new(-4.0, 0.5, 9.0),
        );
        assert_eq!(position_of(&m), Vec3::new(-4.0, 0.5, 9.0));
    }
}
