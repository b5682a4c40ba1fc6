use glam::{Quat, Vec3};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::culling::BoundingBox;
use crate::scene::{InstanceKey, NodeHandle, RenderableKey};

/// One renderable captured at a simulation tick.
///
/// A record is a self-contained render packet: everything submission needs
/// is snapshotted here, so the render pass never has to chase assets and a
/// node deleted between ticks cannot invalidate it. `node` doubles as the
/// entity identity records are matched across generations by.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub node: NodeHandle,
    pub renderable: RenderableKey,
    pub layer: u32,
    pub geometry: Uuid,
    pub material: Uuid,
    pub triangles: u32,
    /// Local-space bounds; culled against after applying the (possibly
    /// interpolated) world transform.
    pub bounds: BoundingBox,
    /// Skinned instance whose palette buffer the submission binds.
    pub instance: Option<InstanceKey>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

#[derive(Debug, Default)]
struct Generations {
    current: Vec<DrawCall>,
    previous: Vec<DrawCall>,
}

/// Double-buffered draw-call generations.
///
/// The fixed-rate simulation tick fills the current generation; the
/// variable-rate render tick reads both to interpolate. One mutex guards
/// both generations and the swap, so recording, swapping, and render
/// iteration are mutually exclusive no matter which thread drives which
/// tick.
#[derive(Debug, Default)]
pub struct DrawCallStore {
    inner: Mutex<Generations>,
}

impl DrawCallStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotates generations: current becomes previous and the new current is
    /// cleared for recording. Call exactly once per simulation tick, before
    /// recording that tick's calls.
    pub fn begin_tick(&self) {
        let mut generations = self.inner.lock();
        let generations = &mut *generations;
        std::mem::swap(&mut generations.current, &mut generations.previous);
        generations.current.clear();
    }

    pub fn record(&self, call: DrawCall) {
        self.inner.lock().current.push(call);
    }

    /// Number of records in the current generation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().current.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits every current record with its previous-generation match, held
    /// under the lock for the whole iteration so a concurrent tick cannot
    /// swap generations mid-pass. Records new this tick get `None`.
    pub fn for_each_pair(&self, mut f: impl FnMut(&DrawCall, Option<&DrawCall>)) {
        let generations = self.inner.lock();
        for call in &generations.current {
            let previous = generations.previous.iter().find(|p| p.node == call.node);
            f(call, previous);
        }
    }
}
