use glam::{Affine3A, Quat, Vec3};
use uuid::Uuid;

use marionette::animation::{Channel, Keyframe};
use marionette::assets::{
    Condition, Parameter, ParameterKind, ParameterValue, Predicate, SkeletonBone, SkeletonNode,
    State, StateMachineAsset, Transition,
};
use marionette::culling::BoundingBox;
use marionette::render::{BufferHandle, RenderState, ViewId, ViewSetup};
use marionette::{
    AnimationClip, AnimationSystem, Animator, AssetCache, Camera, FrameClock, RenderBackend,
    RenderFrameScheduler, Renderable, Scene, SkeletonAsset, SkinnedMeshAsset, SkinningSystem,
};

/// Stands in for a GPU driver: counts submissions, reports buffer traffic.
#[derive(Default)]
struct ConsoleBackend {
    next_buffer: u64,
    submissions: u64,
    buffer_writes: u64,
}

impl RenderBackend for ConsoleBackend {
    fn create_buffer(&mut self, data: &[u8]) -> BufferHandle {
        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        println!("  palette buffer #{} allocated ({} bytes)", handle.0, data.len());
        handle
    }

    fn write_buffer(&mut self, _buffer: BufferHandle, _data: &[u8]) {
        self.buffer_writes += 1;
    }

    fn begin_view(&mut self, _view: ViewId, _setup: &ViewSetup) {}

    fn submit(&mut self, _view: ViewId, _state: &RenderState, _triangles: u32, _instances: u32) {
        self.submissions += 1;
    }
}

fn swaying_clip(name: &str, ticks_per_second: f32, sway: f32, knee_bend: f32) -> AnimationClip {
    AnimationClip::new(name, 2.0, ticks_per_second)
        .with_channel(Channel::new(1).with_positions(vec![
            Keyframe::new(0.0, Vec3::new(0.0, 1.0, 0.0)),
            Keyframe::new(1.0, Vec3::new(sway, 1.0, 0.0)),
            Keyframe::new(2.0, Vec3::new(0.0, 1.0, 0.0)),
        ]))
        .with_channel(Channel::new(2).with_rotations(vec![
            Keyframe::new(0.0, Quat::IDENTITY),
            Keyframe::new(1.0, Quat::from_rotation_x(knee_bend.to_radians())),
            Keyframe::new(2.0, Quat::IDENTITY),
        ]))
}

fn main() -> marionette::Result<()> {
    env_logger::init();

    let mut cache = AssetCache::new();

    let skeleton = SkeletonAsset::new(
        "Biped",
        "Armature",
        vec![
            SkeletonNode::new("Armature", None),
            SkeletonNode::new("Hip", Some(0))
                .with_bind_pose(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE),
            SkeletonNode::new("Knee", Some(1))
                .with_bind_pose(Vec3::new(0.0, -0.5, 0.0), Quat::IDENTITY, Vec3::ONE),
        ],
    );
    cache.register_skeleton(skeleton.clone())?;

    let walk = cache.register_clip(swaying_clip("walk", 2.0, 0.25, 30.0))?;
    let run = cache.register_clip(swaying_clip("run", 4.0, 0.75, 70.0))?;

    let machine = StateMachineAsset {
        parameters: vec![Parameter {
            name: "running".to_string(),
            kind: ParameterKind::Bool,
        }],
        states: vec![
            State {
                name: "walk".to_string(),
                clip: "walk".to_string(),
                looping: true,
                transitions: vec![Transition {
                    target: "run".to_string(),
                    on_finish: false,
                    any: false,
                    conditions: vec![Condition {
                        parameter: "running".to_string(),
                        predicate: Predicate::Equal,
                        value: ParameterValue::Bool(true),
                    }],
                }],
            },
            State {
                name: "run".to_string(),
                clip: "run".to_string(),
                looping: true,
                transitions: vec![Transition {
                    target: "walk".to_string(),
                    on_finish: false,
                    any: false,
                    conditions: vec![Condition {
                        parameter: "running".to_string(),
                        predicate: Predicate::Equal,
                        value: ParameterValue::Bool(false),
                    }],
                }],
            },
        ],
        ..StateMachineAsset::new("locomotion")
    };
    let machine_id = cache.register_state_machine(machine)?;

    let mesh = SkinnedMeshAsset::new(
        "BipedBody",
        skeleton.id,
        vec![
            SkeletonBone::new("Hip", Affine3A::from_translation(Vec3::new(0.0, -1.0, 0.0))),
            SkeletonBone::new("Knee", Affine3A::from_translation(Vec3::new(0.0, -0.5, 0.0))),
        ],
        BoundingBox::from_center_size(Vec3::new(0.0, -0.25, 0.0), Vec3::new(1.0, 2.5, 1.0)),
    )
    .with_triangles(2_400);
    let mesh_id = cache.register_skinned_mesh(mesh)?;

    let mut scene = Scene::new();
    let camera = scene.add_node("Camera");
    scene.set_camera(camera, Camera::perspective(60.0, 0.1, 100.0));

    let armature = scene.instantiate_skeleton(&skeleton)?;
    scene.node_mut(armature).unwrap().transform.position = Vec3::new(0.0, 0.0, -4.0);
    let hip = scene.find_descendant_by_name(armature, "Hip").unwrap();
    scene.set_renderable(hip, Renderable::skinned(mesh_id, Uuid::new_v4()));

    let animator = Animator::new(skeleton.id)
        .with_clip(cache.require_clip(walk)?)
        .with_clip(cache.require_clip(run)?)
        .with_state_machine(machine_id);
    scene.set_animator(armature, animator);

    println!("Simulating three seconds of a walk breaking into a run...");

    let mut scheduler = RenderFrameScheduler::new(1280, 720);
    let mut backend = ConsoleBackend::default();
    let mut clock = FrameClock::new();
    let refresh_rate = clock.refresh_rate();

    for frame in 0..180u32 {
        let steps = clock.advance(1.0 / 60.0);
        for _ in 0..steps {
            AnimationSystem::update(&mut scene, &cache, clock.fixed_delta(), refresh_rate);
            scene.update_hierarchy();
            scheduler.collect_draw_calls(&mut scene, &cache);
            SkinningSystem::update(
                &mut scene,
                &cache,
                &mut backend,
                clock.fixed_delta(),
                refresh_rate,
            );
        }
        scheduler.submit_interpolated(&scene, &cache, clock.alpha(), &mut backend);

        if frame == 89 {
            println!("  flipping `running` to true");
            if let Some(animator) = scene.animator_mut(armature) {
                animator.set_bool_parameter("running", true);
            }
        }

        if frame % 30 == 29 {
            let state = scene
                .animator_mut(armature)
                .and_then(|a| a.current_state().map(str::to_string))
                .unwrap_or_default();
            let hip_x = scene.node(hip).unwrap().world_matrix().translation.x;
            let stats = scheduler.stats();
            println!(
                "  t = {:.1}s  state = {state:<4}  hip.x = {hip_x:+.3}  submitted = {} ({} tris)",
                f64::from(frame + 1) / 60.0,
                stats.submitted,
                stats.triangles,
            );
        }
    }

    println!(
        "Done: {} frames, {} draw submissions, {} palette uploads",
        clock.frame_count, backend.submissions, backend.buffer_writes,
    );
    Ok(())
}
