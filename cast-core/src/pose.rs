//! Camera primitives: mono look-at pose, per-eye stereo matrices, and the
//! projection×view composition handed to the scene renderer.

use glam::{Mat4, Vec3};

/// Mono camera placement: eye point, focus point, up direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub eye: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
}

impl Default for Pose {
    /// Neutral camera: two meters back from the origin, Y up. Hosts with a
    /// scene renderer pass its own default pose to [`crate::StreamCore`]
    /// instead.
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 2.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

/// Per-eye stereo camera data: projection and view matrix for each eye, in
/// the order they travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoFrame {
    pub projection_left: Mat4,
    pub view_left: Mat4,
    pub projection_right: Mat4,
    pub view_right: Mat4,
}

impl StereoFrame {
    /// Composite projection×view matrix per eye, ready for the renderer.
    pub fn eye_composites(&self) -> (Mat4, Mat4) {
        (
            self.projection_left * self.view_left,
            self.projection_right * self.view_right,
        )
    }
}

/// Build a [`Mat4`] from 16 values laid out row-major, the order matrices
/// are serialized on the wire. glam stores column-major internally.
pub fn mat4_from_row_major(values: &[f32; 16]) -> Mat4 {
    Mat4::from_cols_array(values).transpose()
}

/// Flatten a [`Mat4`] back to row-major wire order.
pub fn mat4_to_row_major(m: &Mat4) -> [f32; 16] {
    m.transpose().to_cols_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_load_keeps_rows() {
        let vals: [f32; 16] = std::array::from_fn(|i| i as f32);
        let m = mat4_from_row_major(&vals);
        // First wire row becomes the matrix's first row.
        assert_eq!(m.row(0), glam::Vec4::new(0.0, 1.0, 2.0, 3.0));
        assert_eq!(m.row(3), glam::Vec4::new(12.0, 13.0, 14.0, 15.0));
    }

    #[test]
    fn row_major_roundtrip() {
        let vals: [f32; 16] = std::array::from_fn(|i| (i as f32) * 0.25 - 1.0);
        let m = mat4_from_row_major(&vals);
        assert_eq!(mat4_to_row_major(&m), vals);
    }

    #[test]
    fn eye_composites_multiply_projection_by_view() {
        let proj = Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
        let view = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let frame = StereoFrame {
            projection_left: proj,
            view_left: view,
            projection_right: Mat4::IDENTITY,
            view_right: Mat4::IDENTITY,
        };
        let (left, right) = frame.eye_composites();
        assert_eq!(left, proj * view);
        assert_eq!(right, Mat4::IDENTITY);
    }
}
