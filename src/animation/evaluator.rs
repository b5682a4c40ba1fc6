use std::sync::Arc;

use slotmap::SlotMap;

use crate::animation::clip::{AnimationClip, Keyframe};
use crate::animation::values::Interpolatable;
use crate::scene::node::Node;
use crate::scene::NodeHandle;

/// Playback position of one clip on one animator.
///
/// Time is kept in clip ticks. A looping clip wraps modulo its duration; a
/// non-looping clip clamps at the duration and raises the finished flag,
/// which is the signal finish-triggered transitions read.
#[derive(Debug, Clone, Default)]
pub struct Playback {
    clip: Option<Arc<AnimationClip>>,
    looping: bool,
    time: f32,
    finished: bool,
}

impl Playback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `clip` from the beginning, replacing whatever was playing.
    pub fn play(&mut self, clip: Arc<AnimationClip>, looping: bool) {
        self.clip = Some(clip);
        self.looping = looping;
        self.time = 0.0;
        self.finished = false;
    }

    pub fn stop(&mut self) {
        self.clip = None;
        self.time = 0.0;
        self.finished = false;
    }

    /// Jumps to `time` ticks into the clip. Clears the finished flag so a
    /// clamped clip resumes from the new position.
    pub fn seek(&mut self, time: f32) {
        self.time = time.max(0.0);
        self.finished = false;
    }

    #[must_use]
    pub fn clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    #[must_use]
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Current play time in clip ticks.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// True iff the clip is non-looping and play time has reached its
    /// duration. Always false while looping.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn advance(&mut self, delta_ticks: f32) {
        let Some(clip) = &self.clip else { return };
        let duration = clip.duration;
        if duration <= 0.0 || self.finished {
            return;
        }
        self.time += delta_ticks;
        if self.time >= duration {
            if self.looping {
                self.time %= duration;
            } else {
                self.time = duration;
                self.finished = true;
            }
        }
    }
}

/// Cached key indices for one channel, one per track kind.
#[derive(Debug, Clone, Copy, Default)]
struct ChannelCursor {
    position: usize,
    rotation: usize,
    scale: usize,
}

/// Samples a clip's channels and writes the pose into scene nodes.
///
/// Holds one cached key index per track, exploited because play time is
/// normally monotonic; all cursors fall back to a full scan from the front
/// when time moves backward (loop wrap or seek). Rebuilt whenever the
/// animator switches clips, so cursor count always matches the channel
/// count.
#[derive(Debug)]
pub struct ClipEvaluator {
    cursors: Vec<ChannelCursor>,
    last_time: f32,
    timer: f32,
    primed: bool,
}

impl ClipEvaluator {
    #[must_use]
    pub fn new(clip: &AnimationClip) -> Self {
        Self {
            cursors: vec![ChannelCursor::default(); clip.channels.len()],
            last_time: 0.0,
            timer: 0.0,
            primed: false,
        }
    }

    /// Advances play time by `delta` seconds and samples a pose, writing
    /// position/rotation/scale straight into the nodes `node_cache` maps
    /// each channel to.
    ///
    /// Play time accrues on every call; `sample_interval` (seconds, from the
    /// skeleton's authored rate) only gates how often a pose is actually
    /// sampled from it, and until enough wall time has accumulated this
    /// returns false without sampling. The first call after construction
    /// always samples, so a freshly started clip never spends its first
    /// throttle window unposed. Channels whose node is unresolved are
    /// skipped.
    pub fn evaluate(
        &mut self,
        playback: &mut Playback,
        delta: f32,
        sample_interval: f32,
        node_cache: &[Option<NodeHandle>],
        nodes: &mut SlotMap<NodeHandle, Node>,
    ) -> bool {
        let Some(clip) = playback.clip().cloned() else {
            return false;
        };

        playback.advance(delta * clip.effective_ticks_per_second());

        self.timer += delta;
        if self.primed && self.timer < sample_interval {
            return false;
        }
        self.timer = 0.0;
        self.primed = true;

        let time = playback.time();
        if time < self.last_time {
            self.cursors.fill(ChannelCursor::default());
        }
        self.last_time = time;

        // Holds when the evaluator was built for this clip; guards seeks
        // across a clip swap the owner has not reconciled yet.
        if self.cursors.len() != clip.channels.len() {
            self.cursors = vec![ChannelCursor::default(); clip.channels.len()];
        }

        for (channel, cursor) in clip.channels.iter().zip(&mut self.cursors) {
            let Some(&Some(handle)) = node_cache.get(channel.node) else {
                continue;
            };
            let Some(node) = nodes.get_mut(handle) else {
                continue;
            };
            if let Some(position) =
                sample_track(&channel.position_keys, time, clip.duration, &mut cursor.position)
            {
                node.transform.position = position;
            }
            if let Some(rotation) =
                sample_track(&channel.rotation_keys, time, clip.duration, &mut cursor.rotation)
            {
                node.transform.rotation = rotation;
            }
            if let Some(scale) =
                sample_track(&channel.scale_keys, time, clip.duration, &mut cursor.scale)
            {
                node.transform.scale = scale;
            }
        }

        true
    }
}

/// Samples one track at `time`, advancing the cached cursor.
///
/// The key after the last wraps to the first so a looping clip blends the
/// tail back into the head; the key span then gains one full duration to
/// stay positive. A zero span (coincident keys, or a clamped clip sitting
/// exactly on its final key) yields the current key's exact value.
fn sample_track<T: Interpolatable>(
    keys: &[Keyframe<T>],
    time: f32,
    duration: f32,
    cursor: &mut usize,
) -> Option<T> {
    if keys.is_empty() {
        return None;
    }
    if keys.len() == 1 {
        *cursor = 0;
        return Some(keys[0].value);
    }

    let mut index = (*cursor).min(keys.len() - 1);
    if keys[index].time > time {
        index = 0;
    }
    while index + 1 < keys.len() && keys[index + 1].time <= time {
        index += 1;
    }
    *cursor = index;

    let current = keys[index];
    let next = keys[(index + 1) % keys.len()];

    let mut span = next.time - current.time;
    if span < 0.0 {
        span += duration;
    }
    if span <= f32::EPSILON {
        return Some(current.value);
    }

    let t = ((time - current.time) / span).clamp(0.0, 1.0);
    if t <= 0.0 {
        return Some(current.value);
    }
    Some(T::interpolate_linear(current.value, next.value, t))
}
