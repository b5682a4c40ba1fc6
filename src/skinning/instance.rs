use glam::{Affine3A, Mat4};
use slotmap::SlotMap;
use uuid::Uuid;

use crate::assets::AssetCache;
use crate::render::backend::{BufferHandle, RenderBackend};
use crate::scene::node::Node;
use crate::scene::{InstanceKey, NodeHandle, Scene, SkeletonRoot};

#[derive(Debug, Clone, Copy)]
struct ResolvedBone {
    node: Option<NodeHandle>,
    offset: Affine3A,
}

/// Bones of one registered mesh, in palette order.
#[derive(Debug, Clone)]
struct MeshPalette {
    mesh: Uuid,
    bones: Vec<ResolvedBone>,
}

/// Shared per-skeleton skinning state.
///
/// Aggregates every node of one skeleton: the name-resolved scene node for
/// each asset node (cached, `None` for nodes a model variant lacks), the
/// flattened bone-matrix array across all registered meshes, and the GPU
/// buffer mirroring it.
#[derive(Debug)]
pub struct SkinnedInstance {
    /// Skeleton asset this instance poses.
    pub asset: Uuid,
    /// Hierarchy node rooting the skeleton.
    pub root: NodeHandle,
    /// Scene node per skeleton-asset node index.
    pub(crate) node_cache: Vec<Option<NodeHandle>>,
    meshes: Vec<MeshPalette>,
    bone_matrices: Vec<Mat4>,
    buffer: Option<BufferHandle>,
    buffer_len: usize,
    /// Wall time accrued toward the next palette rebuild window.
    timer: f32,
    /// Latched "a contributing transform changed" flag. Change flags on
    /// nodes are transient, so dirt observed during a throttled tick is
    /// remembered here until a rebuild consumes it.
    dirty: bool,
}

impl SkinnedInstance {
    pub(crate) fn new(asset: Uuid, root: NodeHandle, node_cache: Vec<Option<NodeHandle>>) -> Self {
        Self {
            asset,
            root,
            node_cache,
            meshes: Vec::new(),
            bone_matrices: Vec::new(),
            buffer: None,
            buffer_len: 0,
            timer: 0.0,
            dirty: false,
        }
    }

    /// Latest computed palette, flattened in mesh registration order.
    #[must_use]
    pub fn bone_matrices(&self) -> &[Mat4] {
        &self.bone_matrices
    }

    /// GPU mirror of the palette, once the first update has run.
    #[must_use]
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Adds a mesh's bones to the palette, resolving each bone to a cached
    /// scene node. Idempotent per mesh. Returns false when the mesh or its
    /// skeleton is not registered in the cache.
    pub(crate) fn register_mesh(&mut self, cache: &AssetCache, mesh: Uuid) -> bool {
        if self.meshes.iter().any(|p| p.mesh == mesh) {
            return true;
        }
        let Some(mesh_asset) = cache.skinned_mesh(mesh) else {
            return false;
        };
        let Some(skeleton) = cache.skeleton(self.asset) else {
            return false;
        };

        let bones = mesh_asset
            .bones
            .iter()
            .map(|bone| ResolvedBone {
                node: skeleton
                    .node_index(&bone.node)
                    .and_then(|i| self.node_cache.get(i).copied().flatten()),
                offset: bone.offset,
            })
            .collect();
        self.meshes.push(MeshPalette { mesh, bones });

        // Palette layout changed; force a rebuild on the next update.
        self.bone_matrices.clear();
        true
    }

    /// Matrix offset of a mesh's slice within the flattened palette.
    #[must_use]
    pub fn palette_offset(&self, mesh: Uuid) -> Option<usize> {
        let mut offset = 0;
        for palette in &self.meshes {
            if palette.mesh == mesh {
                return Some(offset);
            }
            offset += palette.bones.len();
        }
        None
    }

    /// Recomputes the palette and mirrors it to the GPU.
    ///
    /// Rebuilds run at most once per `interval` seconds (the skeleton's
    /// authored sampling rate), and a window in which no resolved node
    /// moved is skipped outright. A palette whose layout no longer matches
    /// the registered meshes is rebuilt immediately. Every bone matrix is
    /// the bone's world transform re-expressed relative to the skeleton
    /// root's parent (inverted once per update), composed with the bone's
    /// offset transform, so the palette stays independent of where the
    /// skeleton sits in the world. Unresolved bones fall back to the bare
    /// offset.
    pub(crate) fn update(
        &mut self,
        nodes: &SlotMap<NodeHandle, Node>,
        backend: &mut dyn RenderBackend,
        delta: f32,
        interval: f32,
    ) {
        if self.meshes.is_empty() {
            return;
        }

        let total: usize = self.meshes.iter().map(|p| p.bones.len()).sum();
        let missing = self.bone_matrices.len() != total;
        self.dirty = self.dirty
            || self
                .node_cache
                .iter()
                .flatten()
                .any(|&h| nodes.get(h).is_some_and(|n| n.transform.changed()));

        self.timer += delta;
        if missing {
            self.timer = 0.0;
        } else {
            if self.timer < interval {
                return;
            }
            self.timer -= interval;
            // An idle stretch must not queue up several back-to-back
            // rebuilds once movement resumes.
            if self.timer > interval {
                self.timer = interval;
            }
            if !self.dirty {
                return;
            }
        }
        self.dirty = false;

        let inv_root_parent = nodes
            .get(self.root)
            .and_then(Node::parent)
            .and_then(|p| nodes.get(p))
            .map_or(Affine3A::IDENTITY, |n| n.transform.world_matrix().inverse());

        self.bone_matrices.clear();
        self.bone_matrices.reserve(total);
        for palette in &self.meshes {
            for bone in &palette.bones {
                let matrix = match bone.node.and_then(|h| nodes.get(h)) {
                    Some(node) => inv_root_parent * *node.transform.world_matrix() * bone.offset,
                    None => bone.offset,
                };
                self.bone_matrices.push(Mat4::from(matrix));
            }
        }

        let bytes: &[u8] = bytemuck::cast_slice(&self.bone_matrices);
        match self.buffer {
            Some(buffer) if self.buffer_len == bytes.len() => backend.write_buffer(buffer, bytes),
            _ => {
                self.buffer = Some(backend.create_buffer(bytes));
                self.buffer_len = bytes.len();
            }
        }
    }
}

/// Finds or creates the shared instance servicing `start`'s skeleton.
///
/// An existing root marker on `start` or an ancestor wins. Otherwise the
/// nearest ancestor named like the asset's declared root becomes the root
/// and gets the marker, so later lookups from any node under it resolve to
/// the same instance without repeating the name walk.
pub(crate) fn resolve_instance(
    scene: &mut Scene,
    cache: &AssetCache,
    start: NodeHandle,
    skeleton: Uuid,
) -> Option<InstanceKey> {
    if let Some(root) = scene.find_skeleton_root(start, skeleton) {
        if let Some(marker) = scene.skeleton_roots.get(root)
            && let Some(key) = marker.instance
            && scene.instances.contains_key(key)
        {
            return Some(key);
        }
        // Marker without a live instance (fresh, or the instance was
        // removed): build one here.
        return create_instance(scene, cache, root, skeleton);
    }

    let asset = cache.skeleton(skeleton)?;
    let mut cursor = Some(start);
    while let Some(handle) = cursor {
        let Some(node) = scene.nodes.get(handle) else {
            break;
        };
        if node.name == asset.root_name {
            return create_instance(scene, cache, handle, skeleton);
        }
        cursor = node.parent();
    }

    log::debug!(
        "No skeleton root named {:?} above the requesting node for asset {skeleton}",
        asset.root_name
    );
    None
}

fn create_instance(
    scene: &mut Scene,
    cache: &AssetCache,
    root: NodeHandle,
    skeleton: Uuid,
) -> Option<InstanceKey> {
    let asset = cache.skeleton(skeleton)?;
    let node_cache = asset
        .nodes
        .iter()
        .map(|n| scene.find_descendant_by_name(root, &n.name))
        .collect();

    let key = scene
        .instances
        .insert(SkinnedInstance::new(skeleton, root, node_cache));
    match scene.skeleton_roots.get_mut(root) {
        Some(marker) => marker.instance = Some(key),
        None => {
            let mut marker = SkeletonRoot::new(skeleton);
            marker.instance = Some(key);
            scene.skeleton_roots.insert(root, marker);
        }
    }
    Some(key)
}
