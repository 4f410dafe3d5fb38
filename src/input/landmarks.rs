//! Hand and face landmark sets from an external tracker.
//!
//! Coordinates are normalized image space: x right, y down, both 0..1.
//! Hand points follow the 21-point MediaPipe indexing.

use glam::Vec3;

/// Points per hand
pub const HAND_POINTS: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const MIDDLE_MCP: usize = 9;
pub const RING_MCP: usize = 13;
pub const PINKY_MCP: usize = 17;

/// (PIP joint, tip) for index, middle, ring, pinky
pub const FINGER_JOINTS: [(usize, usize); 4] = [(6, 8), (10, 12), (14, 16), (18, 20)];

/// One tracked hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    pub points: [Vec3; HAND_POINTS],
}

impl HandLandmarks {
    /// Build from a flat `x y z` list; extra values are ignored. Rejects
    /// non-finite coordinates.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        if values.len() < HAND_POINTS * 3 {
            return None;
        }
        let mut points = [Vec3::ZERO; HAND_POINTS];
        for (point, xyz) in points.iter_mut().zip(values.chunks_exact(3)) {
            *point = Vec3::new(xyz[0], xyz[1], xyz[2]);
        }
        points.iter().all(|p| p.is_finite()).then_some(Self { points })
    }

    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    /// Mean of the wrist and the four finger bases
    pub fn palm_center(&self) -> Vec3 {
        let sum = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP]
            .iter()
            .map(|&i| self.points[i])
            .sum::<Vec3>();
        sum / 5.0
    }
}

// Indices into the 468/478-point face mesh
const MESH_UPPER_LIP: usize = 13;
const MESH_LOWER_LIP: usize = 14;
const MESH_MOUTH_LEFT: usize = 61;
const MESH_MOUTH_RIGHT: usize = 291;
const MESH_EYE_LEFT: usize = 33;
const MESH_EYE_RIGHT: usize = 263;
const MESH_MIN_POINTS: usize = 468;

/// Number of points in the compact face layout
pub const FACE_POINTS: usize = 6;

/// The face points the mappers need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceLandmarks {
    pub upper_lip: Vec3,
    pub lower_lip: Vec3,
    pub mouth_left: Vec3,
    pub mouth_right: Vec3,
    pub eye_left: Vec3,
    pub eye_right: Vec3,
}

impl FaceLandmarks {
    /// Build from a flat `x y z` list.
    ///
    /// Accepts either the compact six-point layout (upper lip, lower lip,
    /// mouth left, mouth right, eye left, eye right) or a full face mesh.
    /// Rejects non-finite coordinates.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        Self::select(values).filter(|face| face.is_finite())
    }

    fn select(values: &[f32]) -> Option<Self> {
        let at = |i: usize| Vec3::new(values[i * 3], values[i * 3 + 1], values[i * 3 + 2]);
        if values.len() >= MESH_MIN_POINTS * 3 {
            Some(Self {
                upper_lip: at(MESH_UPPER_LIP),
                lower_lip: at(MESH_LOWER_LIP),
                mouth_left: at(MESH_MOUTH_LEFT),
                mouth_right: at(MESH_MOUTH_RIGHT),
                eye_left: at(MESH_EYE_LEFT),
                eye_right: at(MESH_EYE_RIGHT),
            })
        } else if values.len() >= FACE_POINTS * 3 {
            Some(Self {
                upper_lip: at(0),
                lower_lip: at(1),
                mouth_left: at(2),
                mouth_right: at(3),
                eye_left: at(4),
                eye_right: at(5),
            })
        } else {
            None
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.upper_lip,
            self.lower_lip,
            self.mouth_left,
            self.mouth_right,
            self.eye_left,
            self.eye_right,
        ]
        .iter()
        .all(|p| p.is_finite())
    }

    /// Lip gap relative to mouth width (0 = closed, ~0.6 = wide open)
    pub fn mouth_openness(&self) -> f32 {
        let width = self.mouth_left.truncate().distance(self.mouth_right.truncate());
        if width <= f32::EPSILON {
            return 0.0;
        }
        self.upper_lip.truncate().distance(self.lower_lip.truncate()) / width
    }

    /// Head roll in radians from the eye line (positive = clockwise on screen)
    pub fn roll(&self) -> f32 {
        let (a, b) = if self.eye_left.x <= self.eye_right.x {
            (self.eye_left, self.eye_right)
        } else {
            (self.eye_right, self.eye_left)
        };
        (b.y - a.y).atan2(b.x - a.x)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_from_flat_requires_63_values() {
        assert!(HandLandmarks::from_flat(&[0.0; 62]).is_none());
        let values: Vec<f32> = (0..63).map(|i| i as f32).collect();
        let hand = HandLandmarks::from_flat(&values).unwrap();
        assert_eq!(hand.point(20), Vec3::new(60.0, 61.0, 62.0));
    }

    #[test]
    fn test_palm_center() {
        let hand = fixtures::hand(0.3, 0.7, [true; 5]);
        let center = hand.palm_center();
        assert!((center.x - 0.3).abs() < 1e-5);
        assert!((center.y - 0.72).abs() < 1e-5);
    }

    #[test]
    fn test_face_compact_and_mesh_layouts() {
        assert!(FaceLandmarks::from_flat(&[0.0; 17]).is_none());
        assert!(FaceLandmarks::from_flat(&[0.0; 18]).is_some());

        let mut mesh = vec![0.0; 478 * 3];
        mesh[14 * 3 + 1] = 0.25; // lower lip y
        let face = FaceLandmarks::from_flat(&mesh).unwrap();
        assert_eq!(face.lower_lip.y, 0.25);
    }

    #[test]
    fn test_mouth_openness_and_roll() {
        let face = fixtures::face(0.3, 0.0);
        assert!((face.mouth_openness() - 0.3).abs() < 1e-4);
        assert!(face.roll().abs() < 1e-5);

        let tilted = fixtures::face(0.0, 0.2);
        assert!((tilted.roll() - 0.2).abs() < 1e-4);
        assert_eq!(tilted.mouth_openness(), 0.0);
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let mut values = vec![0.5; HAND_POINTS * 3];
        values[10] = f32::NAN;
        assert!(HandLandmarks::from_flat(&values).is_none());
        values[10] = f32::INFINITY;
        assert!(HandLandmarks::from_flat(&values).is_none());

        let mut face = vec![0.5; FACE_POINTS * 3];
        face[4] = f32::NAN;
        assert!(FaceLandmarks::from_flat(&face).is_none());

        // Only the selected mesh points matter
        let mut mesh = vec![0.5; MESH_MIN_POINTS * 3];
        mesh[0] = f32::NAN;
        assert!(FaceLandmarks::from_flat(&mesh).is_some());
        mesh[MESH_MOUTH_RIGHT * 3 + 1] = f32::NAN;
        assert!(FaceLandmarks::from_flat(&mesh).is_none());
    }
}
