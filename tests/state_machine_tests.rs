//! Animation State Machine Tests
//!
//! Tests for:
//! - Asset validation (empty machines, duplicate names, dangling targets)
//! - Start-state entry and synchronous transitions on parameter writes
//! - Deterministic first-match transition ordering
//! - Condition semantics (all/any, type guards, bool ordering, unknowns)
//! - Finish-triggered transitions through the animation system
//! - Lazy controller attachment from a registered asset
//! - JSON deserialization of authored machines

use std::sync::Arc;

use uuid::Uuid;

use marionette::animation::AnimationClip;
use marionette::assets::{
    AssetCache, Condition, Parameter, ParameterKind, ParameterValue, Predicate, SkeletonAsset,
    SkeletonNode, State, StateMachineAsset, Transition,
};
use marionette::errors::EngineError;
use marionette::scene::{NodeHandle, Scene};
use marionette::{AnimationSystem, Animator};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn parameter(name: &str, kind: ParameterKind) -> Parameter {
    Parameter {
        name: name.to_string(),
        kind,
    }
}

fn condition(parameter: &str, predicate: Predicate, value: ParameterValue) -> Condition {
    Condition {
        parameter: parameter.to_string(),
        predicate,
        value,
    }
}

fn transition(target: &str, conditions: Vec<Condition>) -> Transition {
    Transition {
        target: target.to_string(),
        on_finish: false,
        any: false,
        conditions,
    }
}

fn state(name: &str, clip: &str, looping: bool, transitions: Vec<Transition>) -> State {
    State {
        name: name.to_string(),
        clip: clip.to_string(),
        looping,
        transitions,
    }
}

/// Channel-less clip; enough for driving playback and finish flags.
fn bare_clip(name: &str, duration: f32) -> Arc<AnimationClip> {
    Arc::new(AnimationClip::new(name, duration, 1.0))
}

/// walk <-> run, driven by the bool parameter "running".
fn walk_run_machine() -> StateMachineAsset {
    let mut machine = StateMachineAsset::new("locomotion");
    machine.parameters = vec![
        parameter("running", ParameterKind::Bool),
        parameter("speed", ParameterKind::Float),
    ];
    machine.states = vec![
        state(
            "walk",
            "walk",
            true,
            vec![transition(
                "run",
                vec![condition("running", Predicate::Equal, ParameterValue::Bool(true))],
            )],
        ),
        state(
            "run",
            "run",
            true,
            vec![transition(
                "walk",
                vec![condition("running", Predicate::Equal, ParameterValue::Bool(false))],
            )],
        ),
    ];
    machine
}

/// Animator preloaded with walk/run clips and the given controller.
fn animator_with(machine: StateMachineAsset) -> Animator {
    let mut animator = Animator::new(Uuid::new_v4());
    animator.add_clip(bare_clip("walk", 10.0));
    animator.add_clip(bare_clip("run", 10.0));
    animator.set_controller(Arc::new(machine));
    animator
}

/// Minimal scene with one registered, instantiated skeleton.
fn scene_with_skeleton(cache: &mut AssetCache) -> (Scene, NodeHandle, Uuid) {
    let skeleton = SkeletonAsset::new("Rig", "Armature", vec![SkeletonNode::new("Armature", None)]);
    let id = cache.register_skeleton(skeleton.clone()).unwrap();
    let mut scene = Scene::new();
    let root = scene.instantiate_skeleton(&skeleton).unwrap();
    (scene, root, id)
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn validate_rejects_empty_machine() {
    let machine = StateMachineAsset::new("empty");
    assert!(matches!(
        machine.validate(),
        Err(EngineError::InvalidStateMachine(_))
    ));
}

#[test]
fn validate_rejects_duplicate_state_names() {
    let mut machine = StateMachineAsset::new("dup");
    machine.states = vec![
        state("idle", "idle", true, vec![]),
        state("idle", "other", true, vec![]),
    ];
    assert!(machine.validate().is_err());
}

#[test]
fn validate_rejects_duplicate_parameter_names() {
    let mut machine = StateMachineAsset::new("dup");
    machine.parameters = vec![
        parameter("speed", ParameterKind::Float),
        parameter("speed", ParameterKind::Int),
    ];
    machine.states = vec![state("idle", "idle", true, vec![])];
    assert!(machine.validate().is_err());
}

#[test]
fn validate_tolerates_dangling_targets() {
    let mut machine = StateMachineAsset::new("dangling");
    machine.parameters = vec![parameter("go", ParameterKind::Bool)];
    machine.states = vec![state(
        "idle",
        "idle",
        true,
        vec![transition(
            "ghost",
            vec![condition("go", Predicate::Equal, ParameterValue::Bool(true))],
        )],
    )];
    // Warns, but stays usable: the transition just never completes.
    assert!(machine.validate().is_ok());
}

#[test]
fn cache_rejects_invalid_machines() {
    let mut cache = AssetCache::new();
    assert!(cache.register_state_machine(StateMachineAsset::new("empty")).is_err());

    let id = cache.register_state_machine(walk_run_machine()).unwrap();
    let fetched = cache.state_machine(id).expect("machine should be stored");
    assert_eq!(fetched.name, "locomotion");
}

// ============================================================================
// State Entry and Parameter-Driven Transitions
// ============================================================================

#[test]
fn controller_enters_first_declared_state() {
    let animator = animator_with(walk_run_machine());

    assert_eq!(animator.current_state(), Some("walk"));
    let clip = animator.playback().clip().expect("start state clip should play");
    assert_eq!(clip.name, "walk");
    assert!(animator.playback().looping());
}

#[test]
fn parameter_write_switches_state_synchronously() {
    let mut animator = animator_with(walk_run_machine());

    animator.set_bool_parameter("running", true);

    assert_eq!(animator.current_state(), Some("run"));
    assert_eq!(animator.playback().clip().unwrap().name, "run");

    animator.set_bool_parameter("running", false);
    assert_eq!(animator.current_state(), Some("walk"));
}

#[test]
fn first_satisfied_transition_wins() {
    let mut machine = StateMachineAsset::new("priority");
    machine.parameters = vec![parameter("speed", ParameterKind::Float)];
    machine.states = vec![
        state(
            "idle",
            "walk",
            true,
            vec![
                transition(
                    "first",
                    vec![condition("speed", Predicate::Greater, ParameterValue::Float(1.0))],
                ),
                transition(
                    "second",
                    vec![condition("speed", Predicate::Greater, ParameterValue::Float(1.0))],
                ),
            ],
        ),
        state("first", "walk", true, vec![]),
        state("second", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_float_parameter("speed", 2.0);

    assert_eq!(
        animator.current_state(),
        Some("first"),
        "Declared order decides between simultaneously satisfiable transitions"
    );
}

#[test]
fn one_write_takes_at_most_one_hop() {
    // a --flag--> b --speed>0.5--> a
    let mut machine = StateMachineAsset::new("chain");
    machine.parameters = vec![
        parameter("flag", ParameterKind::Bool),
        parameter("speed", ParameterKind::Float),
    ];
    machine.states = vec![
        state(
            "a",
            "walk",
            true,
            vec![transition(
                "b",
                vec![condition("flag", Predicate::Equal, ParameterValue::Bool(true))],
            )],
        ),
        state(
            "b",
            "run",
            true,
            vec![transition(
                "a",
                vec![condition("speed", Predicate::Greater, ParameterValue::Float(0.5))],
            )],
        ),
    ];
    let mut animator = animator_with(machine);

    // Pre-arm b's exit condition, then enter b. The same write must not
    // chain straight through b back to a.
    animator.set_float_parameter("speed", 0.7);
    assert_eq!(animator.current_state(), Some("a"));

    animator.set_bool_parameter("flag", true);
    assert_eq!(animator.current_state(), Some("b"));
}

#[test]
fn ignored_writes_still_evaluate_transitions() {
    let mut machine = StateMachineAsset::new("chain");
    machine.parameters = vec![
        parameter("flag", ParameterKind::Bool),
        parameter("speed", ParameterKind::Float),
    ];
    machine.states = vec![
        state(
            "a",
            "walk",
            true,
            vec![transition(
                "b",
                vec![condition("flag", Predicate::Equal, ParameterValue::Bool(true))],
            )],
        ),
        state(
            "b",
            "run",
            true,
            vec![transition(
                "a",
                vec![condition("speed", Predicate::Greater, ParameterValue::Float(0.5))],
            )],
        ),
    ];
    let mut animator = animator_with(machine);
    animator.set_float_parameter("speed", 0.7);
    animator.set_bool_parameter("flag", true);
    assert_eq!(animator.current_state(), Some("b"));

    // Type-mismatched write: the slot must keep its value, but the already
    // satisfied exit condition gets its evaluation chance.
    animator.set_int_parameter("flag", 3);

    assert_eq!(animator.current_state(), Some("a"));
    assert_eq!(
        animator.controller().unwrap().parameter("flag"),
        Some(ParameterValue::Bool(true)),
        "A mismatched write must not overwrite the slot"
    );
}

#[test]
fn dangling_target_is_skipped_and_scanning_continues() {
    let mut machine = StateMachineAsset::new("dangling");
    machine.parameters = vec![parameter("go", ParameterKind::Bool)];
    machine.states = vec![
        state(
            "idle",
            "walk",
            true,
            vec![
                transition(
                    "ghost",
                    vec![condition("go", Predicate::Equal, ParameterValue::Bool(true))],
                ),
                transition(
                    "real",
                    vec![condition("go", Predicate::Equal, ParameterValue::Bool(true))],
                ),
            ],
        ),
        state("real", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_bool_parameter("go", true);

    assert_eq!(animator.current_state(), Some("real"));
}

// ============================================================================
// Condition Semantics
// ============================================================================

#[test]
fn all_conditions_must_hold_by_default() {
    let mut machine = StateMachineAsset::new("and");
    machine.parameters = vec![
        parameter("armed", ParameterKind::Bool),
        parameter("speed", ParameterKind::Float),
    ];
    machine.states = vec![
        state(
            "idle",
            "walk",
            true,
            vec![transition(
                "go",
                vec![
                    condition("armed", Predicate::Equal, ParameterValue::Bool(true)),
                    condition("speed", Predicate::Greater, ParameterValue::Float(5.0)),
                ],
            )],
        ),
        state("go", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_float_parameter("speed", 10.0);
    assert_eq!(animator.current_state(), Some("idle"), "One of two conditions is not enough");

    animator.set_bool_parameter("armed", true);
    assert_eq!(animator.current_state(), Some("go"));
}

#[test]
fn any_flag_turns_conditions_into_or() {
    let mut machine = StateMachineAsset::new("or");
    machine.parameters = vec![
        parameter("armed", ParameterKind::Bool),
        parameter("speed", ParameterKind::Float),
    ];
    machine.states = vec![
        state(
            "idle",
            "walk",
            true,
            vec![Transition {
                target: "go".to_string(),
                on_finish: false,
                any: true,
                conditions: vec![
                    condition("armed", Predicate::Equal, ParameterValue::Bool(true)),
                    condition("speed", Predicate::Greater, ParameterValue::Float(5.0)),
                ],
            }],
        ),
        state("go", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_float_parameter("speed", 10.0);

    assert_eq!(animator.current_state(), Some("go"));
}

#[test]
fn bool_ordering_predicates_never_fire() {
    let mut machine = StateMachineAsset::new("bool-order");
    machine.parameters = vec![parameter("flag", ParameterKind::Bool)];
    machine.states = vec![
        state(
            "idle",
            "walk",
            true,
            vec![transition(
                "go",
                vec![condition("flag", Predicate::Greater, ParameterValue::Bool(true))],
            )],
        ),
        state("go", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_bool_parameter("flag", true);

    assert_eq!(animator.current_state(), Some("idle"));
}

#[test]
fn unknown_condition_parameter_never_fires() {
    let mut machine = StateMachineAsset::new("unknown");
    machine.parameters = vec![parameter("known", ParameterKind::Bool)];
    machine.states = vec![
        state(
            "idle",
            "walk",
            true,
            vec![transition(
                "go",
                vec![condition("missing", Predicate::Equal, ParameterValue::Bool(true))],
            )],
        ),
        state("go", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_bool_parameter("known", true);

    assert_eq!(animator.current_state(), Some("idle"));
}

#[test]
fn type_mismatched_condition_never_fires() {
    let mut machine = StateMachineAsset::new("mismatch");
    machine.parameters = vec![parameter("count", ParameterKind::Int)];
    machine.states = vec![
        state(
            "idle",
            "walk",
            true,
            vec![transition(
                "go",
                vec![condition("count", Predicate::Greater, ParameterValue::Float(0.5))],
            )],
        ),
        state("go", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_int_parameter("count", 10);

    assert_eq!(animator.current_state(), Some("idle"));
}

#[test]
fn triggerless_transition_never_fires() {
    let mut machine = StateMachineAsset::new("inert");
    machine.parameters = vec![parameter("noise", ParameterKind::Int)];
    machine.states = vec![
        state("idle", "walk", true, vec![transition("go", vec![])]),
        state("go", "run", true, vec![]),
    ];
    let mut animator = animator_with(machine);

    animator.set_int_parameter("noise", 1);
    animator.set_int_parameter("noise", 2);

    assert_eq!(animator.current_state(), Some("idle"));
}

// ============================================================================
// Finish-Triggered Transitions
// ============================================================================

#[test]
fn finish_transition_fires_when_clip_ends() {
    let mut machine = StateMachineAsset::new("intro");
    machine.states = vec![
        state(
            "intro",
            "intro",
            false,
            vec![Transition {
                target: "idle".to_string(),
                on_finish: true,
                any: false,
                conditions: vec![],
            }],
        ),
        state("idle", "idle", true, vec![]),
    ];

    let mut cache = AssetCache::new();
    let (mut scene, root, skeleton_id) = scene_with_skeleton(&mut cache);
    let animator = Animator::new(skeleton_id)
        .with_clip(bare_clip("intro", 1.0))
        .with_clip(bare_clip("idle", 10.0));
    scene.set_animator(root, animator);
    scene
        .animator_mut(root)
        .unwrap()
        .set_controller(Arc::new(machine));
    assert_eq!(scene.animator_mut(root).unwrap().current_state(), Some("intro"));

    // 1.5s step finishes the one-tick intro; the same tick must hand off.
    AnimationSystem::update(&mut scene, &cache, 1.5, 60);

    let animator = scene.animator_mut(root).unwrap();
    assert_eq!(animator.current_state(), Some("idle"));
    assert_eq!(animator.playback().clip().unwrap().name, "idle");
    assert!(!animator.finished(), "The handed-off clip starts fresh");
}

#[test]
fn satisfied_condition_does_not_refire_each_tick() {
    let mut cache = AssetCache::new();
    let (mut scene, root, skeleton_id) = scene_with_skeleton(&mut cache);
    let animator = Animator::new(skeleton_id)
        .with_clip(bare_clip("walk", 10.0))
        .with_clip(bare_clip("run", 10.0));
    scene.set_animator(root, animator);
    scene
        .animator_mut(root)
        .unwrap()
        .set_controller(Arc::new(walk_run_machine()));
    scene.animator_mut(root).unwrap().set_bool_parameter("running", true);
    assert_eq!(scene.animator_mut(root).unwrap().current_state(), Some("run"));

    // Three ticks with "running" still true: the run clip must keep its
    // accumulated time instead of restarting on every evaluation.
    for _ in 0..3 {
        AnimationSystem::update(&mut scene, &cache, 1.0, 60);
    }

    let animator = scene.animator_mut(root).unwrap();
    assert_eq!(animator.current_state(), Some("run"));
    let time = animator.playback().time();
    assert!(approx(time, 3.0), "Expected uninterrupted playback at t=3, got {time}");
}

#[test]
fn controller_attaches_lazily_from_registered_asset() {
    let mut cache = AssetCache::new();
    let (mut scene, root, skeleton_id) = scene_with_skeleton(&mut cache);
    let machine_id = cache.register_state_machine(walk_run_machine()).unwrap();

    let animator = Animator::new(skeleton_id)
        .with_state_machine(machine_id)
        .with_clip(bare_clip("walk", 10.0))
        .with_clip(bare_clip("run", 10.0));
    scene.set_animator(root, animator);
    assert!(scene.animator_mut(root).unwrap().controller().is_none());

    AnimationSystem::update(&mut scene, &cache, 0.1, 60);

    let animator = scene.animator_mut(root).unwrap();
    assert_eq!(animator.current_state(), Some("walk"));
    assert_eq!(animator.playback().clip().unwrap().name, "walk");
}

// ============================================================================
// JSON Authoring
// ============================================================================

#[test]
fn state_machine_deserializes_from_json() {
    let json = r#"{
        "name": "locomotion",
        "parameters": [
            { "name": "running", "kind": "bool" },
            { "name": "gear", "kind": "int" },
            { "name": "speed", "kind": "float" }
        ],
        "states": [
            {
                "name": "walk",
                "clip": "walk_cycle",
                "looping": true,
                "transitions": [
                    {
                        "target": "run",
                        "conditions": [
                            { "parameter": "running", "predicate": "equal", "value": true },
                            { "parameter": "gear", "predicate": "greater_or_equal", "value": 3 },
                            { "parameter": "speed", "predicate": "greater", "value": 0.5 }
                        ]
                    }
                ]
            },
            {
                "name": "run",
                "clip": "run_cycle",
                "looping": true,
                "transitions": [
                    { "target": "walk", "on_finish": true }
                ]
            }
        ]
    }"#;

    let machine: StateMachineAsset = serde_json::from_str(json).expect("valid machine JSON");
    assert!(machine.validate().is_ok());
    assert_eq!(machine.states.len(), 2);
    assert_eq!(machine.parameter("gear").unwrap().kind, ParameterKind::Int);

    // Untagged values take their JSON type.
    let walk = machine.state("walk").unwrap();
    let conditions = &walk.transitions[0].conditions;
    assert_eq!(conditions[0].value, ParameterValue::Bool(true));
    assert_eq!(conditions[1].value, ParameterValue::Int(3));
    assert_eq!(conditions[1].predicate, Predicate::GreaterOrEqual);
    assert!(matches!(conditions[2].value, ParameterValue::Float(v) if approx(v, 0.5)));

    // Defaults fill the omitted fields.
    assert!(!walk.transitions[0].on_finish);
    assert!(!walk.transitions[0].any);
    let run = machine.state("run").unwrap();
    assert!(run.transitions[0].on_finish);
    assert!(run.transitions[0].conditions.is_empty());

    let mut cache = AssetCache::new();
    let id = cache.register_state_machine(machine).unwrap();
    assert!(cache.state_machine(id).is_some());
}
