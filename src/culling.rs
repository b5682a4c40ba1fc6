//! View-frustum culling.
//!
//! Extracts the six clipping planes of a camera from its view-projection
//! matrix (Gribb-Hartmann method) and classifies points and axis-aligned
//! bounding boxes against them. Renderables classified [`Visibility::Invisible`]
//! are never submitted for drawing.

use glam::{Affine3A, Mat4, Vec3, Vec4};

/// Slack applied to the point test so points lying exactly on a plane still
/// count as inside.
const PLANE_EPSILON: f32 = f32::EPSILON;

/// Axis-aligned bounding box in whatever space its producer defines.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms the box and re-wraps the result in a new axis-aligned box.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);

        for point in corners {
            let transformed = matrix.transform_point3(point);
            new_min = new_min.min(transformed);
            new_max = new_max.max(transformed);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

/// Result of classifying a bounding box against the frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Entirely inside all six planes.
    Visible,
    /// Straddles at least one plane but is excluded by none.
    Intersecting,
    /// Entirely outside at least one plane.
    Invisible,
}

/// Six frustum planes stored as `(normal.xyz, distance)`.
///
/// Plane order: left, right, bottom, top, near, far. Call [`update`]
/// whenever the camera's view or projection changes, then query with
/// [`test_point`] / [`test_aabb`] any number of times.
///
/// [`update`]: FrustumCuller::update
/// [`test_point`]: FrustumCuller::test_point
/// [`test_aabb`]: FrustumCuller::test_aabb
#[derive(Debug, Clone, Copy, Default)]
pub struct FrustumCuller {
    planes: [Vec4; 6],
}

impl FrustumCuller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the six planes from a view and projection matrix.
    ///
    /// Gribb-Hartmann extraction from the rows of `projection * view`:
    /// left/right from row4 +- row1, bottom/top from row4 +- row2, near/far
    /// from row4 +- row3. Each plane is normalized so its normal has unit
    /// length, dividing the distance term by the same factor. The extraction
    /// assumes a GL-style `[-1, 1]` clip-space depth range.
    pub fn update(&mut self, view: Mat4, projection: Mat4) {
        let m = projection * view;
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [
            rows[3] + rows[0], // Left
            rows[3] - rows[0], // Right
            rows[3] + rows[1], // Bottom
            rows[3] - rows[1], // Top
            rows[3] + rows[2], // Near
            rows[3] - rows[2], // Far
        ];

        for plane in &mut planes {
            let length = Vec3::new(plane.x, plane.y, plane.z).length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        self.planes = planes;
    }

    /// Returns `true` when the point lies inside or on all six planes.
    #[must_use]
    pub fn test_point(&self, point: Vec3) -> bool {
        for plane in &self.planes {
            let distance = plane.x * point.x + plane.y * point.y + plane.z * point.z + plane.w;
            if distance < -PLANE_EPSILON {
                return false;
            }
        }
        true
    }

    /// Classifies an axis-aligned bounding box against the frustum.
    ///
    /// Per plane, the corner most along the plane normal (the positive
    /// vertex) decides full exclusion: if even that corner is behind the
    /// plane the box is [`Visibility::Invisible`] and no further planes need
    /// checking. When the positive vertex is in front but the opposite
    /// corner is behind, the box straddles the plane; the remaining planes
    /// are still checked because a later one may prove full exclusion.
    #[must_use]
    pub fn test_aabb(&self, aabb: &BoundingBox) -> Visibility {
        let mut result = Visibility::Visible;

        for plane in &self.planes {
            let normal = Vec3::new(plane.x, plane.y, plane.z);
            let in_front = normal.cmpge(Vec3::ZERO);
            let positive = Vec3::select(in_front, aabb.max, aabb.min);
            let negative = Vec3::select(in_front, aabb.min, aabb.max);

            if normal.dot(positive) + plane.w < 0.0 {
                return Visibility::Invisible;
            }
            if normal.dot(negative) + plane.w < 0.0 {
                result = Visibility::Intersecting;
            }
        }

        result
    }

    /// The raw planes, ordered left, right, bottom, top, near, far.
    #[must_use]
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }
}
