mod values;
pub mod animator;
pub mod clip;
pub mod controller;
pub mod evaluator;
pub mod system;

pub use animator::Animator;
pub use clip::{AnimationClip, Channel, Keyframe};
pub use controller::AnimationController;
pub use evaluator::{ClipEvaluator, Playback};
pub use system::AnimationSystem;
pub use values::Interpolatable;
