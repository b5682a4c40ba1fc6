//! Asset descriptions and the in-memory asset cache.
//!
//! Assets are immutable once registered: the cache hands out `Arc` clones and
//! never mutates a stored asset, so systems can hold onto them across frames
//! without lifetime ties to the cache.

pub mod cache;
pub mod skeleton_asset;
pub mod state_machine;

pub use cache::AssetCache;
pub use skeleton_asset::{SkeletonAsset, SkeletonBone, SkeletonNode, SkinnedMeshAsset};
pub use state_machine::{
    Condition, Parameter, ParameterKind, ParameterValue, Predicate, State, StateMachineAsset,
    Transition,
};
