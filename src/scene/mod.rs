//! Scene hierarchy substrate.
//!
//! A deliberately small node/transform tree the animation runtime mutates
//! and the render scheduler reads:
//! - [`Node`]: hierarchy entry (name, parent/children, layer, visibility)
//! - [`Transform`]: TRS with cached local/world matrices and change tracking
//! - [`Scene`]: node storage plus typed component pools
//! - [`transform_system`]: decoupled world-matrix update pass

pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use node::Node;
pub use scene::{Scene, SkeletonRoot};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Generation-checked handle to a [`Node`]. A handle to a removed node
    /// fails lookup instead of aliasing whatever reused the slot.
    pub struct NodeHandle;

    pub struct CameraKey;
    pub struct RenderableKey;
    pub struct AnimatorKey;
    pub struct InstanceKey;
    pub struct AttachmentKey;
}
