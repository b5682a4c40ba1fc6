use bitflags::bitflags;
use glam::{Affine3A, Mat4, Vec4};

use crate::render::backend::Viewport;

bitflags! {
    /// Which attachments a camera clears before drawing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Per-camera clear behavior, applied before any submission for its view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearPolicy {
    pub flags: ClearFlags,
    pub color: Vec4,
}

impl ClearPolicy {
    /// Leave the previous contents in place (overlay cameras).
    #[must_use]
    pub fn none() -> Self {
        Self {
            flags: ClearFlags::empty(),
            color: Vec4::ZERO,
        }
    }

    #[must_use]
    pub fn depth_only() -> Self {
        Self {
            flags: ClearFlags::DEPTH,
            color: Vec4::ZERO,
        }
    }

    #[must_use]
    pub fn color_and_depth(color: Vec4) -> Self {
        Self {
            flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            color,
        }
    }
}

impl Default for ClearPolicy {
    fn default() -> Self {
        Self::color_and_depth(Vec4::new(0.1, 0.1, 0.1, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective { fov: f32, near: f32, far: f32 },
    /// `size` is the full vertical extent of the view volume.
    Orthographic { size: f32, near: f32, far: f32 },
}

/// Camera component.
///
/// The view matrix comes from the carrying node's world transform; the
/// camera itself only holds projection and output policy. Cameras render in
/// ascending `order`, and `layer_mask` selects which node layers the camera
/// sees.
#[derive(Debug, Clone)]
pub struct Camera {
    pub projection: Projection,
    pub viewport: Viewport,
    pub order: i32,
    pub layer_mask: u32,
    pub clear: ClearPolicy,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 0.1, 1000.0)
    }
}

impl Camera {
    #[must_use]
    pub fn perspective(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective {
                fov: fov_degrees.to_radians(),
                near,
                far,
            },
            viewport: Viewport::default(),
            order: 0,
            layer_mask: u32::MAX,
            clear: ClearPolicy::default(),
        }
    }

    #[must_use]
    pub fn orthographic(size: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic { size, near, far },
            viewport: Viewport::default(),
            order: 0,
            layer_mask: u32::MAX,
            clear: ClearPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_layer_mask(mut self, mask: u32) -> Self {
        self.layer_mask = mask;
        self
    }

    #[must_use]
    pub fn with_clear(mut self, clear: ClearPolicy) -> Self {
        self.clear = clear;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Projection matrix for the given aspect ratio.
    ///
    /// Both variants produce a GL-style `[-1, 1]` clip-space depth range,
    /// which is what the frustum plane extraction expects.
    #[must_use]
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = aspect.max(f32::EPSILON);
        match self.projection {
            Projection::Perspective { fov, near, far } => {
                Mat4::perspective_rh_gl(fov, aspect, near, far)
            }
            Projection::Orthographic { size, near, far } => {
                let half_height = size * 0.5;
                let half_width = half_height * aspect;
                Mat4::orthographic_rh_gl(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    near,
                    far,
                )
            }
        }
    }

    /// View matrix: the inverse of the camera node's world transform.
    #[must_use]
    pub fn view_matrix(world: &Affine3A) -> Mat4 {
        Mat4::from(world.inverse())
    }
}
