use glam::Affine3A;

use crate::scene::NodeHandle;
use crate::scene::transform::Transform;

/// Default layer bit assigned to new nodes.
pub const DEFAULT_LAYER: u32 = 1;

/// A minimal scene node containing only per-frame hot data.
///
/// # Design
///
/// - Only keeps data traversed every frame (hierarchy, transform, layer,
///   visibility)
/// - Component data (cameras, renderables, animators, attachments) lives in
///   [`Scene`](crate::scene::Scene) component maps keyed by [`NodeHandle`]
///
/// # Hierarchy
///
/// Nodes form a tree through parent-child relationships:
/// - `parent`: optional handle to the parent node (`None` for roots)
/// - `children`: list of child node handles
#[derive(Debug, Clone)]
pub struct Node {
    /// Name used for bone resolution and debugging.
    pub name: String,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    /// Transform component (hot data accessed every frame).
    pub transform: Transform,

    // === Core State ===
    /// Layer bits tested against a camera's layer mask.
    pub layer: u32,
    /// Visibility flag; invisible nodes are skipped by the scheduler.
    pub visible: bool,
}

impl Node {
    /// Creates a named node with default transform and visibility.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            layer: DEFAULT_LAYER,
            visible: true,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns a reference to the world transformation matrix.
    ///
    /// Updated by the transform system each frame.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}
