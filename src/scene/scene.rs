use slotmap::{SlotMap, SparseSecondaryMap};
use uuid::Uuid;

use crate::animation::animator::Animator;
use crate::assets::skeleton_asset::SkeletonAsset;
use crate::errors::{EngineError, Result};
use crate::render::camera::Camera;
use crate::render::renderable::Renderable;
use crate::scene::node::Node;
use crate::scene::transform_system;
use crate::scene::{AnimatorKey, AttachmentKey, CameraKey, InstanceKey, NodeHandle, RenderableKey};
use crate::skinning::attachment::BoneAttachment;
use crate::skinning::instance::SkinnedInstance;

/// Marker placed on the hierarchy node that roots one skeleton.
///
/// Skinned renderers and animators anywhere underneath resolve to the same
/// [`SkinnedInstance`] by walking their ancestors for a marker whose asset id
/// matches. The marker is what makes instance sharing explicit instead of
/// inferred from hierarchy depth.
#[derive(Debug, Clone, Copy)]
pub struct SkeletonRoot {
    /// Skeleton asset this node roots.
    pub asset: Uuid,
    /// Instance servicing this root, filled in on first resolve.
    pub(crate) instance: Option<InstanceKey>,
}

impl SkeletonRoot {
    #[must_use]
    pub fn new(asset: Uuid) -> Self {
        Self {
            asset,
            instance: None,
        }
    }
}

/// Scene graph and component storage.
///
/// Scene is a pure data layer: node hierarchy plus typed component pools,
/// with the per-frame systems (transforms, animation, skinning, scheduling)
/// operating on it from the outside. Component pools are `SlotMap`s; the
/// node-to-component association lives in sparse secondary maps keyed by
/// [`NodeHandle`].
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // === Component pools ===
    pub cameras: SlotMap<CameraKey, Camera>,
    pub camera_components: SparseSecondaryMap<NodeHandle, CameraKey>,

    pub renderables: SlotMap<RenderableKey, Renderable>,
    pub renderable_components: SparseSecondaryMap<NodeHandle, RenderableKey>,

    pub animators: SlotMap<AnimatorKey, Animator>,
    pub animator_components: SparseSecondaryMap<NodeHandle, AnimatorKey>,

    pub attachments: SlotMap<AttachmentKey, BoneAttachment>,
    pub attachment_components: SparseSecondaryMap<NodeHandle, AttachmentKey>,

    // === Skinning ===
    pub instances: SlotMap<InstanceKey, SkinnedInstance>,
    pub skeleton_roots: SparseSecondaryMap<NodeHandle, SkeletonRoot>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),

            cameras: SlotMap::with_key(),
            camera_components: SparseSecondaryMap::new(),

            renderables: SlotMap::with_key(),
            renderable_components: SparseSecondaryMap::new(),

            animators: SlotMap::with_key(),
            animator_components: SparseSecondaryMap::new(),

            attachments: SlotMap::with_key(),
            attachment_components: SparseSecondaryMap::new(),

            instances: SlotMap::with_key(),
            skeleton_roots: SparseSecondaryMap::new(),
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Adds a node at the scene root.
    pub fn add_node(&mut self, name: &str) -> NodeHandle {
        let handle = self.nodes.insert(Node::new(name));
        self.root_nodes.push(handle);
        handle
    }

    /// Adds a node as a child of `parent`.
    pub fn add_child(&mut self, name: &str, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(Node::new(name));
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        if let Some(c) = self.nodes.get_mut(handle) {
            c.parent = Some(parent);
        }
        handle
    }

    /// Reparents `child` under `parent`, detaching from its old parent.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself");
            return;
        }

        // 1. Detach from old
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }

        // 2. Attach to new
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        } else {
            log::error!("Parent node not found during attach");
            self.root_nodes.push(child);
            return;
        }

        // 3. Update child
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    /// Removes a node, its subtree, and every component attached to them.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        let children = if let Some(node) = self.nodes.get(handle) {
            node.children.clone()
        } else {
            return;
        };

        for child in children {
            self.remove_node(child);
        }

        // Unlink from parent or the root list
        let parent = self.nodes.get(handle).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(parent)
                && let Some(i) = p.children.iter().position(|&x| x == handle)
            {
                p.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == handle) {
            self.root_nodes.remove(i);
        }

        // Component cleanup
        if let Some(key) = self.camera_components.remove(handle) {
            self.cameras.remove(key);
        }
        if let Some(key) = self.renderable_components.remove(handle) {
            self.renderables.remove(key);
        }
        if let Some(key) = self.animator_components.remove(handle) {
            self.animators.remove(key);
        }
        if let Some(key) = self.attachment_components.remove(handle) {
            self.attachments.remove(key);
        }
        if let Some(marker) = self.skeleton_roots.remove(handle)
            && let Some(instance) = marker.instance
        {
            self.instances.remove(instance);
        }

        self.nodes.remove(handle);
    }

    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Finds the first node named `name` in the subtree rooted at `root`
    /// (including `root` itself). Depth-first, declaration order.
    #[must_use]
    pub fn find_descendant_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if node.name == name {
                return Some(handle);
            }
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        None
    }

    /// Updates world matrices for the whole hierarchy.
    ///
    /// Call once per simulation tick, after gameplay and animation have
    /// written local transforms and before bone-matrix or draw-call
    /// collection reads world state.
    pub fn update_hierarchy(&mut self) {
        transform_system::update_hierarchy(&mut self.nodes, &self.root_nodes);
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches a camera component to `node`.
    pub fn set_camera(&mut self, node: NodeHandle, camera: Camera) -> CameraKey {
        let key = self.cameras.insert(camera);
        self.camera_components.insert(node, key);
        key
    }

    /// Attaches a renderable component to `node`.
    pub fn set_renderable(&mut self, node: NodeHandle, renderable: Renderable) -> RenderableKey {
        let key = self.renderables.insert(renderable);
        self.renderable_components.insert(node, key);
        key
    }

    /// Attaches an animator component to `node`.
    pub fn set_animator(&mut self, node: NodeHandle, mut animator: Animator) -> AnimatorKey {
        animator.node = node;
        let key = self.animators.insert(animator);
        self.animator_components.insert(node, key);
        key
    }

    /// Attaches a bone-attachment component to `node`.
    pub fn set_attachment(&mut self, node: NodeHandle, mut attachment: BoneAttachment) -> AttachmentKey {
        attachment.node = node;
        let key = self.attachments.insert(attachment);
        self.attachment_components.insert(node, key);
        key
    }

    pub fn animator_mut(&mut self, node: NodeHandle) -> Option<&mut Animator> {
        let key = self.animator_components.get(node)?;
        self.animators.get_mut(*key)
    }

    // ========================================================================
    // Skeletons
    // ========================================================================

    /// Marks `node` as the skeleton root for `asset`.
    ///
    /// Usually registered automatically the first time a skinned renderer or
    /// animator underneath resolves its instance; explicit registration is
    /// for hierarchies whose root name does not match the asset.
    pub fn set_skeleton_root(&mut self, node: NodeHandle, asset: Uuid) {
        self.skeleton_roots.insert(node, SkeletonRoot::new(asset));
    }

    /// Walks from `start` up through its ancestors and returns the first
    /// node carrying a skeleton-root marker for `asset`.
    #[must_use]
    pub fn find_skeleton_root(&self, start: NodeHandle, asset: Uuid) -> Option<NodeHandle> {
        let mut cursor = Some(start);
        while let Some(handle) = cursor {
            if let Some(marker) = self.skeleton_roots.get(handle)
                && marker.asset == asset
            {
                return Some(handle);
            }
            cursor = self.nodes.get(handle).and_then(|n| n.parent);
        }
        None
    }

    /// Builds the rest-pose node hierarchy of a skeleton asset into the
    /// scene and returns the root node, marked as the skeleton root.
    ///
    /// Node names, parenting, and bind TRS values come straight from the
    /// asset; the returned subtree is ready for skinned renderers, animators,
    /// and attachments to be placed underneath.
    pub fn instantiate_skeleton(&mut self, asset: &SkeletonAsset) -> Result<NodeHandle> {
        let mut handles = Vec::with_capacity(asset.nodes.len());

        for desc in &asset.nodes {
            let mut node = Node::new(&desc.name);
            node.transform.position = desc.bind_position;
            node.transform.rotation = desc.bind_rotation;
            node.transform.scale = desc.bind_scale;
            handles.push(self.nodes.insert(node));
        }

        for (index, desc) in asset.nodes.iter().enumerate() {
            match desc.parent {
                Some(parent) => {
                    let parent_handle =
                        *handles
                            .get(parent)
                            .ok_or_else(|| EngineError::InvalidSkeletonData(format!(
                                "node {:?} references parent index {parent} out of {} nodes",
                                desc.name,
                                asset.nodes.len()
                            )))?;
                    if let Some(p) = self.nodes.get_mut(parent_handle) {
                        p.children.push(handles[index]);
                    }
                    if let Some(c) = self.nodes.get_mut(handles[index]) {
                        c.parent = Some(parent_handle);
                    }
                }
                None => self.root_nodes.push(handles[index]),
            }
        }

        let root = asset
            .node_index(&asset.root_name)
            .and_then(|i| handles.get(i).copied())
            .or_else(|| handles.first().copied())
            .ok_or_else(|| {
                EngineError::InvalidSkeletonData("skeleton asset has no nodes".to_string())
            })?;

        self.set_skeleton_root(root, asset.id);
        Ok(root)
    }
}
