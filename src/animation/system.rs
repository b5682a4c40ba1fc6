use crate::assets::AssetCache;
use crate::scene::Scene;
use crate::skinning::instance;

/// Animation system.
///
/// Ticks every animator component once per simulation step: resolves the
/// shared skinned instance for its skeleton, samples the active clip into
/// the scene nodes, and lets finish-triggered transitions fire.
/// Uses the `std::mem::take` technique to avoid borrow conflicts.
pub struct AnimationSystem;

impl AnimationSystem {
    /// Updates all animators.
    ///
    /// Run before the hierarchy update so freshly sampled local transforms
    /// propagate to world matrices in the same tick. `delta` is the fixed
    /// simulation step in seconds; `refresh_rate` feeds skeletons that
    /// sample in sync with the display.
    pub fn update(scene: &mut Scene, cache: &AssetCache, delta: f32, refresh_rate: u32) {
        let mut animators = std::mem::take(&mut scene.animators);

        for (_key, animator) in &mut animators {
            // Animators can reference a state machine before the asset is
            // registered; attach the controller as soon as it shows up.
            if animator.controller().is_none()
                && let Some(asset) = animator.state_machine.and_then(|id| cache.state_machine(id))
            {
                animator.set_controller(asset);
            }

            let Some(skeleton) = cache.skeleton(animator.skeleton) else {
                continue;
            };
            let Some(key) = instance::resolve_instance(scene, cache, animator.node, animator.skeleton)
            else {
                continue;
            };
            let Some(inst) = scene.instances.get(key) else {
                continue;
            };
            let interval = skeleton.sample_interval(refresh_rate);
            animator.tick(delta, interval, &inst.node_cache, &mut scene.nodes);
        }

        scene.animators = animators;
    }
}
