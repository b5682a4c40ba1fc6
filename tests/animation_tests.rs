//! Animation Playback and Evaluation Tests
//!
//! Tests for:
//! - Keyframe sampling at exact keys, between keys, and across loop wraps
//! - Monotonic cursor caches and their reset on backward time
//! - Play time advancing every tick while sampling is rate-throttled
//! - Non-looping clamp and the finished flag
//! - Degenerate tracks (single key, coincident keys, unresolved nodes)
//! - Full-scene pose evaluation through the animation system

use std::sync::Arc;

use glam::{Quat, Vec3};
use slotmap::SlotMap;

use marionette::animation::{AnimationClip, Channel, ClipEvaluator, Keyframe, Playback};
use marionette::assets::{AssetCache, SkeletonAsset, SkeletonNode};
use marionette::errors::EngineError;
use marionette::scene::{Node, NodeHandle, Scene};
use marionette::{AnimationSystem, Animator};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

/// One free-standing node plus the cache mapping channel 0 onto it.
fn one_node() -> (SlotMap<NodeHandle, Node>, Vec<Option<NodeHandle>>, NodeHandle) {
    let mut nodes = SlotMap::with_key();
    let handle = nodes.insert(Node::new("Hip"));
    (nodes, vec![Some(handle)], handle)
}

/// Clip sliding channel 0 from the origin to (10, 0, 0) over `duration`
/// ticks at one tick per second.
fn slide_clip(duration: f32) -> Arc<AnimationClip> {
    Arc::new(
        AnimationClip::new("slide", duration, 1.0).with_channel(
            Channel::new(0).with_positions(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(duration, Vec3::new(10.0, 0.0, 0.0)),
            ]),
        ),
    )
}

// ============================================================================
// Track Sampling
// ============================================================================

#[test]
fn samples_exact_first_key() {
    let (mut nodes, cache, handle) = one_node();
    let clip = slide_clip(2.0);
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    let sampled = evaluator.evaluate(&mut playback, 0.0, 0.0, &cache, &mut nodes);

    assert!(sampled, "First evaluate should always produce a pose");
    assert!(approx_vec(nodes[handle].transform.position, Vec3::ZERO));
}

#[test]
fn interpolates_positions_between_keys() {
    let (mut nodes, cache, handle) = one_node();
    let clip = slide_clip(2.0);
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 1.0, 0.0, &cache, &mut nodes);

    let position = nodes[handle].transform.position;
    assert!(
        approx_vec(position, Vec3::new(5.0, 0.0, 0.0)),
        "Expected midpoint (5, 0, 0), got {position:?}"
    );
}

#[test]
fn interpolates_rotation_and_scale() {
    let (mut nodes, cache, handle) = one_node();
    let quarter = Quat::from_rotation_y(90.0_f32.to_radians());
    let clip = Arc::new(
        AnimationClip::new("twist", 2.0, 1.0).with_channel(
            Channel::new(0)
                .with_rotations(vec![
                    Keyframe::new(0.0, Quat::IDENTITY),
                    Keyframe::new(2.0, quarter),
                ])
                .with_scales(vec![
                    Keyframe::new(0.0, Vec3::ONE),
                    Keyframe::new(2.0, Vec3::splat(3.0)),
                ]),
        ),
    );
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 1.0, 0.0, &cache, &mut nodes);

    let transform = &nodes[handle].transform;
    let expected = Quat::from_rotation_y(45.0_f32.to_radians());
    let angle = transform.rotation.angle_between(expected);
    assert!(
        angle < 1e-3,
        "Expected 45 degree slerp midpoint, off by {angle} rad"
    );
    assert!(approx_vec(transform.scale, Vec3::splat(2.0)));
}

#[test]
fn cursor_advances_with_monotonic_time() {
    let (mut nodes, cache, handle) = one_node();
    let clip = Arc::new(
        AnimationClip::new("steps", 3.0, 1.0).with_channel(
            Channel::new(0).with_positions(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(1.0, Vec3::new(10.0, 0.0, 0.0)),
                Keyframe::new(2.0, Vec3::new(20.0, 0.0, 0.0)),
            ]),
        ),
    );
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 0.5, 0.0, &cache, &mut nodes);
    assert!(approx(nodes[handle].transform.position.x, 5.0));

    evaluator.evaluate(&mut playback, 1.0, 0.0, &cache, &mut nodes);
    let x = nodes[handle].transform.position.x;
    assert!(approx(x, 15.0), "Expected 15 at t=1.5, got {x}");
}

#[test]
fn looping_clip_wraps_and_rescans() {
    let (mut nodes, cache, handle) = one_node();
    let clip = Arc::new(
        AnimationClip::new("steps", 3.0, 1.0).with_channel(
            Channel::new(0).with_positions(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(1.0, Vec3::new(10.0, 0.0, 0.0)),
                Keyframe::new(2.0, Vec3::new(20.0, 0.0, 0.0)),
            ]),
        ),
    );
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    // Play deep into the clip so the cursor sits on a late key.
    evaluator.evaluate(&mut playback, 1.5, 0.0, &cache, &mut nodes);
    assert!(approx(nodes[handle].transform.position.x, 15.0));

    // 1.5 + 2.0 = 3.5 wraps to 0.5; the cursor must rescan from the front.
    evaluator.evaluate(&mut playback, 2.0, 0.0, &cache, &mut nodes);
    assert!(
        approx(playback.time(), 0.5),
        "Expected wrapped time 0.5, got {}",
        playback.time()
    );
    let x = nodes[handle].transform.position.x;
    assert!(approx(x, 5.0), "Expected 5 after wrap to t=0.5, got {x}");
}

#[test]
fn looping_blends_tail_back_into_head() {
    let (mut nodes, cache, handle) = one_node();
    // Last key at t=2 but the clip runs to t=4, so t=3 sits halfway through
    // the wrap-around span from (10, 0, 0) back to the origin.
    let clip = Arc::new(
        AnimationClip::new("wrap", 4.0, 1.0).with_channel(
            Channel::new(0).with_positions(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(2.0, Vec3::new(10.0, 0.0, 0.0)),
            ]),
        ),
    );
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 3.0, 0.0, &cache, &mut nodes);

    let x = nodes[handle].transform.position.x;
    assert!(approx(x, 5.0), "Expected tail-to-head midpoint 5, got {x}");
}

#[test]
fn non_looping_clip_clamps_at_final_key() {
    let (mut nodes, cache, handle) = one_node();
    let clip = slide_clip(2.0);
    let mut playback = Playback::new();
    playback.play(clip.clone(), false);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 5.0, 0.0, &cache, &mut nodes);

    assert!(playback.finished());
    assert!(approx(playback.time(), 2.0));
    assert!(
        approx_vec(nodes[handle].transform.position, Vec3::new(10.0, 0.0, 0.0)),
        "Clamped clip should hold its final key value"
    );
}

#[test]
fn seek_clears_finished_and_rescans() {
    let (mut nodes, cache, handle) = one_node();
    let clip = slide_clip(2.0);
    let mut playback = Playback::new();
    playback.play(clip.clone(), false);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 5.0, 0.0, &cache, &mut nodes);
    assert!(playback.finished());

    playback.seek(0.5);
    assert!(!playback.finished());
    evaluator.evaluate(&mut playback, 0.0, 0.0, &cache, &mut nodes);
    let x = nodes[handle].transform.position.x;
    assert!(approx(x, 2.5), "Expected 2.5 after seeking back to t=0.5, got {x}");
}

// ============================================================================
// Sampling Throttle
// ============================================================================

#[test]
fn first_evaluate_samples_despite_throttle() {
    let (mut nodes, cache, handle) = one_node();
    let clip = slide_clip(2.0);
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    let sampled = evaluator.evaluate(&mut playback, 0.0, 10.0, &cache, &mut nodes);

    assert!(sampled, "A freshly built evaluator must not wait out its first window");
    assert!(approx_vec(nodes[handle].transform.position, Vec3::ZERO));
}

#[test]
fn play_time_advances_even_when_sampling_is_skipped() {
    let (mut nodes, cache, handle) = one_node();
    let clip = slide_clip(2.0);
    let mut playback = Playback::new();
    playback.play(clip.clone(), false);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 0.0, 1000.0, &cache, &mut nodes);
    let sampled = evaluator.evaluate(&mut playback, 3.0, 1000.0, &cache, &mut nodes);

    assert!(!sampled, "The throttle window should swallow the second sample");
    assert!(
        playback.finished(),
        "Play time must reach the end even though no pose was written"
    );
    assert!(
        approx_vec(nodes[handle].transform.position, Vec3::ZERO),
        "A skipped sample must leave the node untouched"
    );
}

#[test]
fn throttle_batches_small_deltas() {
    let (mut nodes, cache, handle) = one_node();
    let clip = slide_clip(2.0);
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);
    let interval = 0.1;

    evaluator.evaluate(&mut playback, 0.0, interval, &cache, &mut nodes);
    assert!(!evaluator.evaluate(&mut playback, 0.04, interval, &cache, &mut nodes));
    assert!(!evaluator.evaluate(&mut playback, 0.04, interval, &cache, &mut nodes));
    assert!(approx(nodes[handle].transform.position.x, 0.0));

    // Third small step pushes accumulated time past the window.
    assert!(evaluator.evaluate(&mut playback, 0.04, interval, &cache, &mut nodes));
    let x = nodes[handle].transform.position.x;
    assert!(approx(x, 0.6), "Expected sample at t=0.12 to give 0.6, got {x}");
}

// ============================================================================
// Degenerate Tracks
// ============================================================================

#[test]
fn single_key_track_is_constant() {
    let (mut nodes, cache, handle) = one_node();
    let clip = Arc::new(
        AnimationClip::new("hold", 2.0, 1.0).with_channel(
            Channel::new(0).with_positions(vec![Keyframe::new(0.0, Vec3::new(3.0, 4.0, 5.0))]),
        ),
    );
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 1.3, 0.0, &cache, &mut nodes);

    assert!(approx_vec(nodes[handle].transform.position, Vec3::new(3.0, 4.0, 5.0)));
}

#[test]
fn coincident_keys_yield_exact_values() {
    let (mut nodes, cache, handle) = one_node();
    // Two keys at the same instant: zero span on either side of t=1.
    let clip = Arc::new(
        AnimationClip::new("snap", 2.0, 1.0).with_channel(
            Channel::new(0).with_positions(vec![
                Keyframe::new(1.0, Vec3::new(1.0, 0.0, 0.0)),
                Keyframe::new(1.0, Vec3::new(2.0, 0.0, 0.0)),
            ]),
        ),
    );
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    evaluator.evaluate(&mut playback, 0.5, 0.0, &cache, &mut nodes);
    assert!(approx(nodes[handle].transform.position.x, 1.0));

    evaluator.evaluate(&mut playback, 1.0, 0.0, &cache, &mut nodes);
    let x = nodes[handle].transform.position.x;
    assert!(approx(x, 2.0), "Expected the later coincident key, got {x}");
}

#[test]
fn unresolved_channel_nodes_are_skipped() {
    let (mut nodes, mut cache, handle) = one_node();
    cache.push(None); // channel 1 has no scene node
    let clip = Arc::new(
        AnimationClip::new("partial", 2.0, 1.0)
            .with_channel(Channel::new(0).with_positions(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(2.0, Vec3::new(10.0, 0.0, 0.0)),
            ]))
            .with_channel(Channel::new(1).with_positions(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(2.0, Vec3::new(99.0, 0.0, 0.0)),
            ]))
            .with_channel(Channel::new(7).with_positions(vec![Keyframe::new(0.0, Vec3::ONE)])),
    );
    let mut playback = Playback::new();
    playback.play(clip.clone(), true);
    let mut evaluator = ClipEvaluator::new(&clip);

    // Missing and out-of-range channels must not panic or block channel 0.
    evaluator.evaluate(&mut playback, 1.0, 0.0, &cache, &mut nodes);

    assert!(approx(nodes[handle].transform.position.x, 5.0));
}

#[test]
fn ticks_per_second_falls_back_when_unset() {
    let clip = AnimationClip::new("raw", 10.0, 0.0);
    assert!(approx(clip.effective_ticks_per_second(), 25.0));
    assert!(approx(clip.duration_seconds(), 0.4));

    let timed = AnimationClip::new("timed", 10.0, 50.0);
    assert!(approx(timed.duration_seconds(), 0.2));
}

// ============================================================================
// Animator
// ============================================================================

#[test]
fn playing_an_unknown_clip_errors() {
    let mut animator = Animator::new(uuid::Uuid::new_v4());
    let result = animator.play("nope", true);
    assert!(matches!(result, Err(EngineError::UnknownClip(name)) if name == "nope"));
}

#[test]
fn clip_library_replaces_by_name() {
    let mut animator = Animator::new(uuid::Uuid::new_v4());
    animator.add_clip(slide_clip(2.0));
    animator.add_clip(slide_clip(4.0));

    let clip = animator.clip("slide").expect("clip should be registered");
    assert!(approx(clip.duration, 4.0), "Later registration should win");
}

// ============================================================================
// Scene Integration
// ============================================================================

#[test]
fn animation_system_poses_skeleton_nodes() {
    let mut cache = AssetCache::new();
    let skeleton = SkeletonAsset::new(
        "Humanoid",
        "Armature",
        vec![
            SkeletonNode::new("Armature", None),
            SkeletonNode::new("Hip", Some(0)),
        ],
    );
    let skeleton_id = cache.register_skeleton(skeleton.clone()).unwrap();

    let mut scene = Scene::new();
    let root = scene.instantiate_skeleton(&skeleton).unwrap();

    // Channel 1 = "Hip". Two-tick loop from the origin out to (10, 0, 0).
    let clip = Arc::new(
        AnimationClip::new("slide", 2.0, 1.0).with_channel(
            Channel::new(1).with_positions(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(2.0, Vec3::new(10.0, 0.0, 0.0)),
            ]),
        ),
    );
    let animator = Animator::new(skeleton_id).with_clip(clip);
    scene.set_animator(root, animator);
    scene
        .animator_mut(root)
        .unwrap()
        .play("slide", true)
        .unwrap();

    let hip = scene.find_descendant_by_name(root, "Hip").unwrap();

    // Three one-second steps: t=1 (x=5), wrap to t=0 (x=0), t=1 again.
    AnimationSystem::update(&mut scene, &cache, 1.0, 60);
    assert!(approx(scene.node(hip).unwrap().transform.position.x, 5.0));

    AnimationSystem::update(&mut scene, &cache, 1.0, 60);
    assert!(approx(scene.node(hip).unwrap().transform.position.x, 0.0));

    AnimationSystem::update(&mut scene, &cache, 1.0, 60);
    let x = scene.node(hip).unwrap().transform.position.x;
    assert!(approx(x, 5.0), "Expected x=5 after three 1s steps of a 2s loop, got {x}");
}

#[test]
fn animation_system_skips_unregistered_skeletons() {
    let cache = AssetCache::new();
    let mut scene = Scene::new();
    let node = scene.add_node("Orphan");
    let animator = Animator::new(uuid::Uuid::new_v4()).with_clip(slide_clip(2.0));
    scene.set_animator(node, animator);
    scene.animator_mut(node).unwrap().play("slide", true).unwrap();

    // Nothing to pose, but the pass must run cleanly.
    AnimationSystem::update(&mut scene, &cache, 1.0, 60);

    assert!(approx(scene.node(node).unwrap().transform.position.x, 0.0));
}
