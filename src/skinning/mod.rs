//! Bone-matrix pipeline: shared skinned instances, palette composition, and
//! bone attachments.
//!
//! One [`SkinnedInstance`] exists per skeleton root in the scene, no matter
//! how many renderers or animators reference that skeleton. The instance
//! owns the flattened bone-matrix palette and its GPU mirror; renderers only
//! read the latest palette during submission.

pub mod attachment;
pub mod instance;
pub mod system;

pub use attachment::{AttachmentSystem, BoneAttachment};
pub use instance::SkinnedInstance;
pub use system::SkinningSystem;
