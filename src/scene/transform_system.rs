//! Transform system.
//!
//! Walks the scene hierarchy and recomputes world matrices, decoupled from
//! [`Scene`](crate::scene::Scene) so it only borrows the node storage.
//!
//! Every visited transform's `changed` flag is rewritten by the pass, so the
//! flag is valid exactly for the frame following an update: consumers that
//! run after the pass (bone pipeline, draw collection) read it to skip
//! untouched subtrees.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Updates world matrices for the whole scene graph.
///
/// Iterative with an explicit stack: deep hierarchies (long bone chains)
/// cannot overflow the call stack, and the hot loop borrows `nodes` once.
pub fn update_hierarchy(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    // Work stack: (node handle, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        // 1. Update the local matrix (shadow-state check inside)
        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        // 2. Update the world matrix
        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);
        }
        node.transform.changed = world_needs_update;

        // 3. Push children (reverse order keeps declared processing order)
        let current_world = node.transform.world_matrix;
        let children_count = node.children.len();

        for i in (0..children_count).rev() {
            if let Some(node) = nodes.get(node_handle)
                && let Some(&child_handle) = node.children.get(i)
            {
                stack.push((child_handle, current_world, world_needs_update));
            }
        }
    }
}
