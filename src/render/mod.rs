//! Render scheduling: cameras, draw-call double buffering, and the backend
//! submission contract.
//!
//! Nothing in here talks to a GPU. The scheduler culls, orders, and
//! interpolates, then hands fully-described submissions to whatever
//! implements [`RenderBackend`].

pub mod backend;
pub mod camera;
pub mod draw;
pub mod renderable;
pub mod scheduler;

pub use backend::{
    AUX_BONE_MATRICES, BufferHandle, RenderBackend, RenderState, ViewId, ViewSetup, Viewport,
};
pub use camera::{Camera, ClearFlags, ClearPolicy, Projection};
pub use draw::{DrawCall, DrawCallStore};
pub use renderable::{Renderable, RenderableKind};
pub use scheduler::{FrameStats, RenderFrameScheduler};
