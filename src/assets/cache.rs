use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use uuid::Uuid;

use crate::animation::{AnimationClip, Keyframe};
use crate::assets::{SkeletonAsset, SkinnedMeshAsset, StateMachineAsset};
use crate::errors::{EngineError, Result};

/// Owner of every registered asset, keyed by id.
///
/// Registration validates the asset once and wraps it in an [`Arc`];
/// everything downstream (animators, skeleton instances, the draw
/// scheduler) shares those immutable snapshots and treats a failed lookup
/// as "skip this one for now", so assets can be registered in any order
/// and unregistered data never takes a frame down.
#[derive(Default)]
pub struct AssetCache {
    skeletons: FxHashMap<Uuid, Arc<SkeletonAsset>>,
    skinned_meshes: FxHashMap<Uuid, Arc<SkinnedMeshAsset>>,
    clips: FxHashMap<Uuid, Arc<AnimationClip>>,
    state_machines: FxHashMap<Uuid, Arc<StateMachineAsset>>,
    /// Material ids the loader has reported as still compiling or missing.
    /// Everything not in this set counts as ready.
    pending_materials: FxHashSet<Uuid>,
}

impl AssetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a skeleton and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSkeletonData`] when the node array is
    /// empty, a parent index does not precede its child, or the declared
    /// root name matches no node.
    pub fn register_skeleton(&mut self, asset: SkeletonAsset) -> Result<Uuid> {
        if asset.nodes.is_empty() {
            return Err(EngineError::InvalidSkeletonData(format!(
                "skeleton '{}' has no nodes",
                asset.name
            )));
        }
        for (index, node) in asset.nodes.iter().enumerate() {
            if let Some(parent) = node.parent
                && parent >= index
            {
                return Err(EngineError::InvalidSkeletonData(format!(
                    "skeleton '{}': node '{}' at {index} has parent index {parent}, parents must precede children",
                    asset.name, node.name
                )));
            }
        }
        if asset.node_index(&asset.root_name).is_none() {
            return Err(EngineError::InvalidSkeletonData(format!(
                "skeleton '{}': root '{}' names no node",
                asset.name, asset.root_name
            )));
        }

        let mut seen = FxHashSet::default();
        for node in &asset.nodes {
            if !seen.insert(node.name.as_str()) {
                log::warn!(
                    "skeleton '{}': duplicate node name '{}', name lookups will resolve to the first",
                    asset.name,
                    node.name
                );
            }
        }

        let id = asset.id;
        if self.skeletons.insert(id, Arc::new(asset)).is_some() {
            log::debug!("replaced skeleton asset {id}");
        }
        Ok(id)
    }

    /// Registers a skinned mesh and returns its id.
    ///
    /// The referenced skeleton does not have to be registered yet; bone
    /// names are resolved when an instance first picks the mesh up.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSkeletonData`] when the bone list is
    /// empty.
    pub fn register_skinned_mesh(&mut self, asset: SkinnedMeshAsset) -> Result<Uuid> {
        if asset.bones.is_empty() {
            return Err(EngineError::InvalidSkeletonData(format!(
                "skinned mesh '{}' has no bones",
                asset.name
            )));
        }
        match self.skeletons.get(&asset.skeleton) {
            None => log::warn!(
                "skinned mesh '{}' references unregistered skeleton {}",
                asset.name,
                asset.skeleton
            ),
            Some(skeleton) => {
                for bone in &asset.bones {
                    if skeleton.node_index(&bone.node).is_none() {
                        log::warn!(
                            "skinned mesh '{}': bone '{}' matches no node in skeleton '{}'",
                            asset.name,
                            bone.node,
                            skeleton.name
                        );
                    }
                }
            }
        }

        let id = asset.id;
        if self.skinned_meshes.insert(id, Arc::new(asset)).is_some() {
            log::debug!("replaced skinned mesh asset {id}");
        }
        Ok(id)
    }

    /// Registers an animation clip and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidClipData`] when the duration is not
    /// positive or any channel's keyframes are out of time order.
    pub fn register_clip(&mut self, clip: AnimationClip) -> Result<Uuid> {
        if clip.duration <= 0.0 {
            return Err(EngineError::InvalidClipData(format!(
                "clip '{}' has non-positive duration {}",
                clip.name, clip.duration
            )));
        }
        for channel in &clip.channels {
            if !keys_ordered(&channel.position_keys)
                || !keys_ordered(&channel.rotation_keys)
                || !keys_ordered(&channel.scale_keys)
            {
                return Err(EngineError::InvalidClipData(format!(
                    "clip '{}': channel for node {} has keyframes out of time order",
                    clip.name, channel.node
                )));
            }
        }
        if clip.ticks_per_second <= 0.0 {
            log::warn!(
                "clip '{}' declares {} ticks per second, playback will assume 25",
                clip.name,
                clip.ticks_per_second
            );
        }

        let id = clip.id;
        if self.clips.insert(id, Arc::new(clip)).is_some() {
            log::debug!("replaced animation clip {id}");
        }
        Ok(id)
    }

    /// Registers a state machine and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidStateMachine`] when the asset declares
    /// no states or duplicates a state or parameter name. Dangling
    /// transition targets and unknown condition parameters are logged, not
    /// rejected; they evaluate as dead ends at runtime.
    pub fn register_state_machine(&mut self, asset: StateMachineAsset) -> Result<Uuid> {
        asset.validate()?;
        let id = asset.id;
        if self.state_machines.insert(id, Arc::new(asset)).is_some() {
            log::debug!("replaced state machine asset {id}");
        }
        Ok(id)
    }

    /// Marks a material as ready (or not) for submission.
    ///
    /// Materials themselves live outside this cache with the renderer; the
    /// scheduler only needs the readiness bit so draw calls whose material
    /// is still loading get skipped for the tick instead of submitted
    /// half-built. Unknown ids count as ready.
    pub fn set_material_ready(&mut self, material: Uuid, ready: bool) {
        if ready {
            self.pending_materials.remove(&material);
        } else {
            self.pending_materials.insert(material);
        }
    }

    #[must_use]
    pub fn material_ready(&self, material: Uuid) -> bool {
        !self.pending_materials.contains(&material)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[must_use]
    pub fn skeleton(&self, id: Uuid) -> Option<Arc<SkeletonAsset>> {
        self.skeletons.get(&id).cloned()
    }

    #[must_use]
    pub fn skinned_mesh(&self, id: Uuid) -> Option<Arc<SkinnedMeshAsset>> {
        self.skinned_meshes.get(&id).cloned()
    }

    #[must_use]
    pub fn clip(&self, id: Uuid) -> Option<Arc<AnimationClip>> {
        self.clips.get(&id).cloned()
    }

    #[must_use]
    pub fn state_machine(&self, id: Uuid) -> Option<Arc<StateMachineAsset>> {
        self.state_machines.get(&id).cloned()
    }

    /// Like [`skeleton`](Self::skeleton), for call sites where a missing
    /// asset is a caller bug rather than a load-order gap.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AssetNotFound`] when the id is unregistered.
    pub fn require_skeleton(&self, id: Uuid) -> Result<Arc<SkeletonAsset>> {
        self.skeleton(id).ok_or(EngineError::AssetNotFound(id))
    }

    /// # Errors
    ///
    /// Returns [`EngineError::AssetNotFound`] when the id is unregistered.
    pub fn require_skinned_mesh(&self, id: Uuid) -> Result<Arc<SkinnedMeshAsset>> {
        self.skinned_mesh(id).ok_or(EngineError::AssetNotFound(id))
    }

    /// # Errors
    ///
    /// Returns [`EngineError::AssetNotFound`] when the id is unregistered.
    pub fn require_clip(&self, id: Uuid) -> Result<Arc<AnimationClip>> {
        self.clip(id).ok_or(EngineError::AssetNotFound(id))
    }

    /// # Errors
    ///
    /// Returns [`EngineError::AssetNotFound`] when the id is unregistered.
    pub fn require_state_machine(&self, id: Uuid) -> Result<Arc<StateMachineAsset>> {
        self.state_machine(id).ok_or(EngineError::AssetNotFound(id))
    }
}

fn keys_ordered<T>(keys: &[Keyframe<T>]) -> bool {
    keys.windows(2).all(|pair| pair[0].time <= pair[1].time)
}
