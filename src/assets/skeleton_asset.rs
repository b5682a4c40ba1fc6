use glam::{Affine3A, Quat, Vec3};
use uuid::Uuid;

use crate::culling::BoundingBox;

/// One joint in a skeleton's rest-pose hierarchy.
///
/// Nodes are listed parent-before-child, so `parent` always points at an
/// earlier entry.
#[derive(Debug, Clone)]
pub struct SkeletonNode {
    pub name: String,
    pub parent: Option<usize>,
    pub bind_position: Vec3,
    pub bind_rotation: Quat,
    pub bind_scale: Vec3,
}

impl SkeletonNode {
    #[must_use]
    pub fn new(name: &str, parent: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            bind_position: Vec3::ZERO,
            bind_rotation: Quat::IDENTITY,
            bind_scale: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn with_bind_pose(mut self, position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        self.bind_position = position;
        self.bind_rotation = rotation;
        self.bind_scale = scale;
        self
    }
}

/// Rest-pose hierarchy of a skeleton, shared by every instance of it.
///
/// The asset also carries the authored sampling rate: how often animation
/// poses and bone palettes for this skeleton are refreshed, independent of
/// how fast the simulation ticks.
#[derive(Debug, Clone)]
pub struct SkeletonAsset {
    pub id: Uuid,
    pub name: String,
    /// Name of the node that roots the hierarchy.
    pub root_name: String,
    pub nodes: Vec<SkeletonNode>,
    /// Authored pose sampling rate in frames per second.
    pub frame_rate: f32,
    /// When set, poses are resampled at the display refresh rate instead of
    /// [`frame_rate`](Self::frame_rate).
    pub sync_to_refresh: bool,
}

impl SkeletonAsset {
    /// Default authored sampling rate for skeletons that do not declare one.
    pub const DEFAULT_FRAME_RATE: f32 = 30.0;

    #[must_use]
    pub fn new(name: &str, root_name: &str, nodes: Vec<SkeletonNode>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            root_name: root_name.to_string(),
            nodes,
            frame_rate: Self::DEFAULT_FRAME_RATE,
            sync_to_refresh: false,
        }
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    #[must_use]
    pub fn with_sync_to_refresh(mut self, sync: bool) -> Self {
        self.sync_to_refresh = sync;
        self
    }

    /// Index of the node named `name`, if present.
    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Seconds between pose samples for this skeleton.
    ///
    /// A non-positive frame rate disables throttling entirely (every update
    /// samples).
    #[must_use]
    pub fn sample_interval(&self, refresh_rate: u32) -> f32 {
        if self.sync_to_refresh {
            1.0 / refresh_rate.max(1) as f32
        } else if self.frame_rate > 0.0 {
            1.0 / self.frame_rate
        } else {
            0.0
        }
    }
}

/// One bone of a skinned mesh: which skeleton node drives it, and the
/// offset (inverse bind) transform taking mesh space into that node's
/// local space at bind time.
#[derive(Debug, Clone)]
pub struct SkeletonBone {
    pub node: String,
    pub offset: Affine3A,
}

impl SkeletonBone {
    #[must_use]
    pub fn new(node: &str, offset: Affine3A) -> Self {
        Self {
            node: node.to_string(),
            offset,
        }
    }
}

/// Skinned mesh description: the skeleton it deforms against, the bones in
/// palette order, rest-pose bounds for culling, and the triangle count the
/// renderer reports at submission.
#[derive(Debug, Clone)]
pub struct SkinnedMeshAsset {
    pub id: Uuid,
    pub name: String,
    /// Skeleton asset this mesh binds to.
    pub skeleton: Uuid,
    /// Bones in the order the bone-matrix palette is laid out.
    pub bones: Vec<SkeletonBone>,
    pub bounds: BoundingBox,
    pub triangles: u32,
}

impl SkinnedMeshAsset {
    #[must_use]
    pub fn new(name: &str, skeleton: Uuid, bones: Vec<SkeletonBone>, bounds: BoundingBox) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            skeleton,
            bones,
            bounds,
            triangles: 0,
        }
    }

    #[must_use]
    pub fn with_triangles(mut self, triangles: u32) -> Self {
        self.triangles = triangles;
        self
    }
}
