use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::animation::clip::AnimationClip;
use crate::animation::controller::AnimationController;
use crate::animation::evaluator::{ClipEvaluator, Playback};
use crate::assets::state_machine::{ParameterValue, StateMachineAsset};
use crate::errors::{EngineError, Result};
use crate::scene::node::Node;
use crate::scene::NodeHandle;

/// Animation component: the clip library, playback state, and optional
/// state-machine controller for one skeleton.
///
/// Place it on or under the skeleton's root node. Clips can be started
/// directly with [`play`](Self::play), or indirectly by attaching a
/// controller, which owns clip selection from then on. Gameplay code drives
/// controller transitions through the typed parameter setters; a setter on
/// an animator without a controller is a no-op.
pub struct Animator {
    pub(crate) node: NodeHandle,
    /// Skeleton asset this animator poses.
    pub skeleton: Uuid,
    /// State-machine asset to attach lazily. The animation system builds the
    /// controller from it on the first tick where the asset is registered.
    pub state_machine: Option<Uuid>,
    clips: FxHashMap<String, Arc<AnimationClip>>,
    playback: Playback,
    evaluator: Option<ClipEvaluator>,
    evaluator_clip: Option<Uuid>,
    controller: Option<AnimationController>,
}

impl Animator {
    #[must_use]
    pub fn new(skeleton: Uuid) -> Self {
        Self {
            node: NodeHandle::default(),
            skeleton,
            state_machine: None,
            clips: FxHashMap::default(),
            playback: Playback::new(),
            evaluator: None,
            evaluator_clip: None,
            controller: None,
        }
    }

    #[must_use]
    pub fn with_state_machine(mut self, state_machine: Uuid) -> Self {
        self.state_machine = Some(state_machine);
        self
    }

    /// Adds a clip to the library under its own name, replacing any clip
    /// already registered under that name.
    pub fn add_clip(&mut self, clip: Arc<AnimationClip>) {
        self.clips.insert(clip.name.clone(), clip);
    }

    #[must_use]
    pub fn with_clip(mut self, clip: Arc<AnimationClip>) -> Self {
        self.add_clip(clip);
        self
    }

    #[must_use]
    pub fn clip(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.clips.get(name)
    }

    /// Starts the named clip from its beginning.
    ///
    /// # Errors
    /// Returns [`EngineError::UnknownClip`] when the library has no clip
    /// under that name.
    pub fn play(&mut self, name: &str, looping: bool) -> Result<()> {
        let clip = self
            .clips
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownClip(name.to_string()))?;
        self.playback.play(clip, looping);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    #[must_use]
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    /// True iff the active clip is non-looping and has reached its end.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.playback.finished()
    }

    // ========================================================================
    // Controller
    // ========================================================================

    /// Attaches a state-machine controller and immediately enters its first
    /// declared state, starting that state's clip.
    pub fn set_controller(&mut self, asset: Arc<StateMachineAsset>) {
        self.controller = Some(AnimationController::new(asset));
        self.enter_current_state();
    }

    /// Detaches the controller. The clip it last started keeps playing.
    pub fn clear_controller(&mut self) {
        self.controller = None;
    }

    #[must_use]
    pub fn controller(&self) -> Option<&AnimationController> {
        self.controller.as_ref()
    }

    /// Name of the controller's active state.
    #[must_use]
    pub fn current_state(&self) -> Option<&str> {
        self.controller
            .as_ref()?
            .current_state()
            .map(|s| s.name.as_str())
    }

    pub fn set_bool_parameter(&mut self, name: &str, value: bool) {
        self.write_parameter(name, ParameterValue::Bool(value));
    }

    pub fn set_int_parameter(&mut self, name: &str, value: i32) {
        self.write_parameter(name, ParameterValue::Int(value));
    }

    pub fn set_float_parameter(&mut self, name: &str, value: f32) {
        self.write_parameter(name, ParameterValue::Float(value));
    }

    /// Writes one parameter slot, then immediately re-evaluates the active
    /// state's transitions so gameplay sees state switches synchronously
    /// with the write. Evaluation runs even when the write was ignored
    /// (unknown name or mismatched type): some other condition may already
    /// hold, and every setter call is a chance to notice.
    fn write_parameter(&mut self, name: &str, value: ParameterValue) {
        let finished = self.playback.finished();
        let switched = match self.controller.as_mut() {
            Some(controller) => {
                controller.set_parameter(name, value);
                controller.evaluate_transitions(finished)
            }
            None => return,
        };
        if switched {
            self.enter_current_state();
        }
    }

    /// Restarts playback on whatever state the controller is now in.
    fn enter_current_state(&mut self) {
        let Some((clip_name, looping)) = self
            .controller
            .as_ref()
            .and_then(AnimationController::current_state)
            .map(|s| (s.clip.clone(), s.looping))
        else {
            return;
        };

        match self.clips.get(&clip_name) {
            Some(clip) => self.playback.play(clip.clone(), looping),
            None => {
                log::warn!(
                    "Animator state wants clip {clip_name:?} but the clip library has no such entry"
                );
                self.playback.stop();
            }
        }
    }

    // ========================================================================
    // Per-tick update
    // ========================================================================

    /// Advances playback, samples the pose into `nodes`, then gives
    /// finish-triggered transitions their once-per-tick chance to fire.
    /// Returns whether a new pose was written.
    pub(crate) fn tick(
        &mut self,
        delta: f32,
        sample_interval: f32,
        node_cache: &[Option<NodeHandle>],
        nodes: &mut SlotMap<NodeHandle, Node>,
    ) -> bool {
        // Cursor caches belong to one clip; rebuild them whenever play()
        // or a transition swapped the clip since the last tick.
        let active = self.playback.clip().map(|c| c.id);
        if active != self.evaluator_clip {
            self.evaluator = self.playback.clip().map(|c| ClipEvaluator::new(c));
            self.evaluator_clip = active;
        }

        let Some(evaluator) = self.evaluator.as_mut() else {
            return false;
        };
        let sampled =
            evaluator.evaluate(&mut self.playback, delta, sample_interval, node_cache, nodes);

        let finished = self.playback.finished();
        let switched = self
            .controller
            .as_mut()
            .is_some_and(|c| c.evaluate_finish_transitions(finished));
        if switched {
            self.enter_current_state();
        }
        sampled
    }
}
