use uuid::Uuid;

use crate::culling::BoundingBox;

/// What a node draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    pub material: Uuid,
    /// Excludes this renderable from every camera without touching the
    /// node's visibility, for gameplay that wants a node present in the
    /// hierarchy but never drawn.
    pub force_off: bool,
    pub kind: RenderableKind,
}

/// A closed set of kinds rather than an open trait: the scheduler matches
/// on the variant to decide how to collect and submit, so adding a kind
/// means extending the match rather than hoping a downcast holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderableKind {
    /// Static geometry, fully self-described.
    Mesh {
        geometry: Uuid,
        /// Local-space bounds, transformed by the node's world matrix for
        /// culling.
        bounds: BoundingBox,
        triangles: u32,
    },
    /// Skinned geometry; bounds, triangle count, and the skeleton binding
    /// come from the registered [`SkinnedMeshAsset`].
    ///
    /// [`SkinnedMeshAsset`]: crate::assets::SkinnedMeshAsset
    Skinned { mesh: Uuid },
}

impl Renderable {
    #[must_use]
    pub fn mesh(geometry: Uuid, material: Uuid, bounds: BoundingBox, triangles: u32) -> Self {
        Self {
            material,
            force_off: false,
            kind: RenderableKind::Mesh {
                geometry,
                bounds,
                triangles,
            },
        }
    }

    #[must_use]
    pub fn skinned(mesh: Uuid, material: Uuid) -> Self {
        Self {
            material,
            force_off: false,
            kind: RenderableKind::Skinned { mesh },
        }
    }

    #[must_use]
    pub fn with_force_off(mut self, force_off: bool) -> Self {
        self.force_off = force_off;
        self
    }
}
