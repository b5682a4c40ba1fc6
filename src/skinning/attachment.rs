use crate::scene::{NodeHandle, Scene};

/// Pins a node to a named bone, for sockets and props.
///
/// Every tick the bone's world-space position, rotation, and scale are
/// copied onto the carrying node. Attachment entities are expected to live
/// at the scene root; a parented attachment still receives the values but
/// its own world matrix only catches up on the next hierarchy pass.
#[derive(Debug, Clone)]
pub struct BoneAttachment {
    pub(crate) node: NodeHandle,
    /// Skeleton root node whose subtree holds the bone.
    pub root: NodeHandle,
    bone_name: String,
    cached_name: String,
    cached_bone: Option<NodeHandle>,
}

impl BoneAttachment {
    #[must_use]
    pub fn new(root: NodeHandle, bone: &str) -> Self {
        Self {
            node: NodeHandle::default(),
            root,
            bone_name: bone.to_string(),
            cached_name: String::new(),
            cached_bone: None,
        }
    }

    #[must_use]
    pub fn bone(&self) -> &str {
        &self.bone_name
    }

    /// Retargets the attachment. The bone is looked up again on the next
    /// tick; until then the old bone keeps driving the node.
    pub fn set_bone(&mut self, name: &str) {
        if name != self.bone_name {
            self.bone_name = name.to_string();
        }
    }
}

/// Bone attachment system.
///
/// Run after the hierarchy update so bone world transforms are current.
/// The bone lookup is cached and only redone when the requested bone name
/// changes; a miss is cached too, so a bone absent from a model variant is
/// not searched for every tick.
pub struct AttachmentSystem;

impl AttachmentSystem {
    pub fn update(scene: &mut Scene) {
        let mut attachments = std::mem::take(&mut scene.attachments);

        for (_key, attachment) in &mut attachments {
            if attachment.cached_name != attachment.bone_name {
                attachment.cached_bone =
                    scene.find_descendant_by_name(attachment.root, &attachment.bone_name);
                attachment.cached_name = attachment.bone_name.clone();
            }

            let Some(world) = attachment
                .cached_bone
                .and_then(|h| scene.nodes.get(h))
                .map(|n| *n.transform.world_matrix())
            else {
                continue;
            };
            let (scale, rotation, position) = world.to_scale_rotation_translation();

            let Some(target) = scene.nodes.get_mut(attachment.node) else {
                continue;
            };
            target.transform.position = position;
            target.transform.rotation = rotation;
            target.transform.scale = scale;
            if target.parent().is_none() {
                // Root-level props can take the bone's world directly and
                // render correctly this very tick.
                target.transform.set_world_matrix(world);
            } else {
                target.transform.mark_dirty();
            }
        }

        scene.attachments = attachments;
    }
}
