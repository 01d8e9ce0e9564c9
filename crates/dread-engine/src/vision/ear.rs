//! Eye aspect ratio from face-mesh landmarks.
//!
//! `EAR = (|p_top_outer - p_bottom_outer| + |p_top_inner - p_bottom_inner|) / (2 |p_corner_a - p_corner_b|)`
//!
//! Distances are full 3D. An open eye sits around 0.25-0.35, a closed one
//! drops toward 0.05.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::vision::landmarks::LandmarkSet;

/// Six face-mesh indices describing one eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeIndices {
    pub corner_a: usize,
    pub corner_b: usize,
    pub top_outer: usize,
    pub bottom_outer: usize,
    pub top_inner: usize,
    pub bottom_inner: usize,
}

/// Subject's left eye in the 468-point face mesh.
pub const LEFT_EYE: EyeIndices = EyeIndices {
    corner_a: 362,
    corner_b: 263,
    top_outer: 385,
    bottom_outer: 380,
    top_inner: 387,
    bottom_inner: 373,
};

/// Subject's right eye in the 468-point face mesh.
pub const RIGHT_EYE: EyeIndices = EyeIndices {
    corner_a: 33,
    corner_b: 133,
    top_outer: 160,
    bottom_outer: 144,
    top_inner: 158,
    bottom_inner: 153,
};

/// One EAR measurement. `average == 0.0` means no usable face.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EarSample {
    pub left: f32,
    pub right: f32,
    pub average: f32,
}

impl EarSample {
    pub const NO_FACE: EarSample = EarSample { left: 0.0, right: 0.0, average: 0.0 };

    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right, average: (left + right) / 2.0 }
    }

    /// Both-eyes-equal sample, handy when only an average is known.
    pub fn uniform(average: f32) -> Self {
        Self::new(average, average)
    }

    pub fn has_face(&self) -> bool {
        self.average > 0.0
    }
}

/// EAR for a single eye, or 0 if any point is missing or the eye has no width.
pub fn eye_aspect_ratio(landmarks: &[Vec3], eye: &EyeIndices) -> f32 {
    let point = |i: usize| landmarks.get(i).copied();
    let (Some(a), Some(b), Some(to), Some(bo), Some(ti), Some(bi)) = (
        point(eye.corner_a),
        point(eye.corner_b),
        point(eye.top_outer),
        point(eye.bottom_outer),
        point(eye.top_inner),
        point(eye.bottom_inner),
    ) else {
        return 0.0;
    };

    let horizontal = a.distance(b);
    if horizontal <= f32::EPSILON || !horizontal.is_finite() {
        return 0.0;
    }
    let ear = (to.distance(bo) + ti.distance(bi)) / (2.0 * horizontal);
    if ear.is_finite() { ear } else { 0.0 }
}

/// Pure: same landmarks, same sample.
pub fn estimate(landmarks: &LandmarkSet) -> EarSample {
    EarSample::new(
        eye_aspect_ratio(landmarks, &LEFT_EYE),
        eye_aspect_ratio(landmarks, &RIGHT_EYE),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A 468-point mesh with both eyes placed so their EAR equals `ear`.
    pub(crate) fn mesh_with_ear(ear: f32) -> LandmarkSet {
        let mut mesh = vec![Vec3::new(0.5, 0.5, 0.0); 468];
        for (eye, cx) in [(LEFT_EYE, 0.65), (RIGHT_EYE, 0.35)] {
            let width = 0.1;
            let half_gap = ear * width / 2.0;
            mesh[eye.corner_a] = Vec3::new(cx - width / 2.0, 0.4, 0.0);
            mesh[eye.corner_b] = Vec3::new(cx + width / 2.0, 0.4, 0.0);
            mesh[eye.top_outer] = Vec3::new(cx - 0.02, 0.4 - half_gap, 0.0);
            mesh[eye.bottom_outer] = Vec3::new(cx - 0.02, 0.4 + half_gap, 0.0);
            mesh[eye.top_inner] = Vec3::new(cx + 0.02, 0.4 - half_gap, 0.0);
            mesh[eye.bottom_inner] = Vec3::new(cx + 0.02, 0.4 + half_gap, 0.0);
        }
        mesh
    }

    #[test]
    fn synthetic_mesh_reproduces_ear() {
        let sample = estimate(&mesh_with_ear(0.3));
        assert!((sample.left - 0.3).abs() < 1e-5, "left {}", sample.left);
        assert!((sample.right - 0.3).abs() < 1e-5, "right {}", sample.right);
        assert!((sample.average - 0.3).abs() < 1e-5);
        assert!(sample.has_face());
    }

    #[test]
    fn depth_counts_toward_distance() {
        let mut mesh = mesh_with_ear(0.0);
        // Lids coincide in x/y but differ in depth.
        mesh[LEFT_EYE.bottom_outer].z = 0.01;
        mesh[LEFT_EYE.bottom_inner].z = 0.01;
        let ear = eye_aspect_ratio(&mesh, &LEFT_EYE);
        assert!((ear - 0.1).abs() < 1e-5, "ear {}", ear);
    }

    #[test]
    fn missing_points_yield_zero_for_that_eye() {
        // Only the right eye (indices < 200) fits in a truncated mesh.
        let mut mesh = mesh_with_ear(0.3);
        mesh.truncate(200);
        let sample = estimate(&mesh);
        assert_eq!(sample.left, 0.0);
        assert!(sample.right > 0.0);
        assert_eq!(sample.average, sample.right / 2.0);
    }

    #[test]
    fn empty_landmarks_read_as_no_face() {
        let sample = estimate(&Vec::new());
        assert_eq!(sample, EarSample::NO_FACE);
        assert!(!sample.has_face());
    }

    #[test]
    fn degenerate_eye_width_is_zero() {
        let mesh = vec![Vec3::ZERO; 468];
        assert_eq!(eye_aspect_ratio(&mesh, &RIGHT_EYE), 0.0);
    }

    #[test]
    fn estimate_is_deterministic() {
        let mesh = mesh_with_ear(0.27);
        let a = estimate(&mesh);
        let b = estimate(&mesh);
        assert_eq!(a.left.to_bits(), b.left.to_bits());
        assert_eq!(a.right.to_bits(), b.right.to_bits());
        assert_eq!(a.average.to_bits(), b.average.to_bits());
    }
}
