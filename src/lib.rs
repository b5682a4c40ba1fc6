pub mod animation;
pub mod assets;
pub mod culling;
pub mod errors;
pub mod render;
pub mod scene;
pub mod skinning;
pub mod time;

pub use animation::{AnimationClip, AnimationController, AnimationSystem, Animator};
pub use assets::{AssetCache, SkeletonAsset, SkinnedMeshAsset, StateMachineAsset};
pub use culling::{BoundingBox, FrustumCuller, Visibility};
pub use errors::{EngineError, Result};
pub use render::{
    Camera, ClearPolicy, Projection, RenderBackend, RenderFrameScheduler, Renderable,
    RenderableKind,
};
pub use scene::{Node, NodeHandle, Scene, Transform};
pub use skinning::{AttachmentSystem, BoneAttachment, SkinningSystem};
pub use time::{ClockSettings, FrameClock};
