use glam::{Quat, Vec3};
use uuid::Uuid;

/// One keyframe: a sample time in clip ticks and the value at that time.
#[derive(Debug, Clone, Copy)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// All tracks animating one skeleton node.
///
/// `node` indexes into the owning skeleton asset's node list. The three key
/// arrays are independently sized and sorted by non-decreasing time; empty
/// arrays leave that part of the node's transform untouched.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub node: usize,
    pub position_keys: Vec<Keyframe<Vec3>>,
    pub rotation_keys: Vec<Keyframe<Quat>>,
    pub scale_keys: Vec<Keyframe<Vec3>>,
}

impl Channel {
    #[must_use]
    pub fn new(node: usize) -> Self {
        Self {
            node,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_positions(mut self, keys: Vec<Keyframe<Vec3>>) -> Self {
        self.position_keys = keys;
        self
    }

    #[must_use]
    pub fn with_rotations(mut self, keys: Vec<Keyframe<Quat>>) -> Self {
        self.rotation_keys = keys;
        self
    }

    #[must_use]
    pub fn with_scales(mut self, keys: Vec<Keyframe<Vec3>>) -> Self {
        self.scale_keys = keys;
        self
    }
}

/// Immutable keyframe animation for one skeleton.
///
/// Key times and `duration` are in clip ticks; `ticks_per_second` maps wall
/// time onto them. A non-positive `ticks_per_second` falls back to 25 at
/// evaluation time, matching common authoring-tool defaults.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub id: Uuid,
    pub name: String,
    /// Clip length in ticks.
    pub duration: f32,
    pub ticks_per_second: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: &str, duration: f32, ticks_per_second: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            duration,
            ticks_per_second,
            channels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Effective ticks-per-second, never zero or negative.
    #[must_use]
    pub fn effective_ticks_per_second(&self) -> f32 {
        if self.ticks_per_second > 0.0 {
            self.ticks_per_second
        } else {
            25.0
        }
    }

    /// Clip length in seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> f32 {
        self.duration / self.effective_ticks_per_second()
    }
}
