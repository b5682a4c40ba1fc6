use glam::Mat4;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::render::camera::ClearPolicy;

/// Index of one camera's output for a frame, assigned in camera render
/// order. Valid until the next render pass reassigns them.
pub type ViewId = u16;

/// Buffer slot name the skinning palette is bound under.
pub const AUX_BONE_MATRICES: &str = "boneMatrices";

/// Opaque handle to a backend-owned structured buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Viewport rectangle in normalized `[0, 1]` surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Per-view state the scheduler sets before any submission for that view.
#[derive(Debug, Clone, Copy)]
pub struct ViewSetup {
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
    pub clear: ClearPolicy,
}

/// Everything one submission carries: the world matrix, opaque geometry and
/// material references for the backend to resolve, and named auxiliary
/// buffers such as the bone-matrix palette.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub world: Mat4,
    pub geometry: Uuid,
    pub material: Uuid,
    pub aux_buffers: SmallVec<[(&'static str, BufferHandle); 1]>,
}

impl RenderState {
    #[must_use]
    pub fn new(world: Mat4, geometry: Uuid, material: Uuid) -> Self {
        Self {
            world,
            geometry,
            material,
            aux_buffers: SmallVec::new(),
        }
    }
}

/// Submission contract between the scheduler and the graphics layer.
///
/// The scheduler guarantees `begin_view` for a view precedes every `submit`
/// into it within a render pass, and that buffer writes for a tick happen
/// before the submissions that reference them.
pub trait RenderBackend {
    /// Creates a structured buffer holding `data`.
    fn create_buffer(&mut self, data: &[u8]) -> BufferHandle;

    /// Overwrites an existing buffer in place. `data` has the same length
    /// the buffer was created with.
    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]);

    /// Opens a view: applies the viewport and clear policy before any
    /// submission targets it.
    fn begin_view(&mut self, view: ViewId, setup: &ViewSetup);

    /// Submits one batch of triangles into a view.
    fn submit(&mut self, view: ViewId, state: &RenderState, triangles: u32, instances: u32);
}
