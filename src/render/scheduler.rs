use glam::{Affine3A, Mat4};

use crate::assets::AssetCache;
use crate::culling::{FrustumCuller, Visibility};
use crate::render::backend::{AUX_BONE_MATRICES, RenderBackend, RenderState, ViewId, ViewSetup};
use crate::render::camera::Camera;
use crate::render::draw::{DrawCall, DrawCallStore};
use crate::render::renderable::RenderableKind;
use crate::scene::{CameraKey, NodeHandle, RenderableKey, Scene};
use crate::skinning::instance;

/// Counters from the most recent passes, for overlays and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    /// Draw calls recorded by the last collection pass.
    pub recorded: usize,
    /// Submissions issued by the last render pass.
    pub submitted: usize,
    /// Submissions that blended against a previous-generation match, as
    /// opposed to newly appeared records submitted untouched.
    pub interpolated: usize,
    /// Candidates the last render pass dropped on layer or frustum tests.
    pub rejected: usize,
    /// Triangles across all submissions of the last render pass.
    pub triangles: u64,
    /// Views opened by the last render pass.
    pub views: usize,
}

/// Decouples the fixed-rate simulation tick from the variable-rate render
/// tick.
///
/// Once per simulation tick, [`collect_draw_calls`] snapshots every
/// camera-visible renderable into the current draw-call generation. Once
/// per render tick, [`submit_interpolated`] blends each snapshot against
/// its previous-generation match by the accumulator-derived alpha and
/// submits per camera, or [`submit_immediate`] bypasses the store and
/// submits live state for drivers running simulation and render at the
/// same rate.
///
/// [`collect_draw_calls`]: Self::collect_draw_calls
/// [`submit_interpolated`]: Self::submit_interpolated
/// [`submit_immediate`]: Self::submit_immediate
pub struct RenderFrameScheduler {
    store: DrawCallStore,
    culler: FrustumCuller,
    stats: FrameStats,
    width: u32,
    height: u32,
}

impl Default for RenderFrameScheduler {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl RenderFrameScheduler {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            store: DrawCallStore::new(),
            culler: FrustumCuller::new(),
            stats: FrameStats::default(),
            width,
            height,
        }
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[must_use]
    pub fn store(&self) -> &DrawCallStore {
        &self.store
    }

    /// Planes of the most recently rendered camera, for visibility queries
    /// outside the scheduler.
    #[must_use]
    pub fn culler(&self) -> &FrustumCuller {
        &self.culler
    }

    // ========================================================================
    // Simulation tick
    // ========================================================================

    /// Rotates the draw-call generations and records every renderable
    /// visible to at least one camera.
    ///
    /// Skinned renderables resolve (creating on first sight) their shared
    /// skeleton instance here and register their mesh into its palette, so
    /// the skinning update that follows this pass uploads complete
    /// palettes. Records carry the per-camera data needed at render time;
    /// the per-camera frustum and layer decision is repeated there against
    /// the interpolated transform.
    pub fn collect_draw_calls(&mut self, scene: &mut Scene, cache: &AssetCache) {
        self.store.begin_tick();
        self.stats.recorded = 0;

        let mut frusta: Vec<(u32, FrustumCuller)> = Vec::new();
        for (camera_key, camera_node) in self.sorted_cameras(scene) {
            let Some(camera) = scene.cameras.get(camera_key) else {
                continue;
            };
            let Some(node) = scene.nodes.get(camera_node) else {
                continue;
            };
            let world = *node.transform.world_matrix();
            let mut culler = FrustumCuller::new();
            culler.update(
                Camera::view_matrix(&world),
                camera.projection_matrix(self.viewport_aspect(camera.viewport.width, camera.viewport.height)),
            );
            frusta.push((camera.layer_mask, culler));
        }

        let components: Vec<(NodeHandle, RenderableKey)> = scene
            .renderable_components
            .iter()
            .map(|(node, key)| (node, *key))
            .collect();

        for (node_handle, renderable_key) in components {
            let Some(node) = scene.nodes.get(node_handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let layer = node.layer;
            let world = *node.transform.world_matrix();
            let Some(renderable) = scene.renderables.get(renderable_key).copied() else {
                continue;
            };
            if renderable.force_off || !cache.material_ready(renderable.material) {
                continue;
            }

            let material = renderable.material;
            let (geometry, bounds, triangles, instance_key) = match renderable.kind {
                RenderableKind::Mesh {
                    geometry,
                    bounds,
                    triangles,
                } => (geometry, bounds, triangles, None),
                RenderableKind::Skinned { mesh } => {
                    let Some(asset) = cache.skinned_mesh(mesh) else {
                        continue;
                    };
                    let instance_key =
                        instance::resolve_instance(scene, cache, node_handle, asset.skeleton);
                    if let Some(key) = instance_key
                        && let Some(inst) = scene.instances.get_mut(key)
                    {
                        inst.register_mesh(cache, mesh);
                    }
                    (mesh, asset.bounds, asset.triangles, instance_key)
                }
            };

            let world_bounds = bounds.transform(&world);
            let seen_by_any = frusta.iter().any(|(mask, culler)| {
                mask & layer != 0 && culler.test_aabb(&world_bounds) != Visibility::Invisible
            });
            if !seen_by_any {
                continue;
            }

            let (scale, rotation, position) = world.to_scale_rotation_translation();
            self.store.record(DrawCall {
                node: node_handle,
                renderable: renderable_key,
                layer,
                geometry,
                material,
                triangles,
                bounds,
                instance: instance_key,
                position,
                rotation,
                scale,
            });
            self.stats.recorded += 1;
        }
    }

    // ========================================================================
    // Render tick
    // ========================================================================

    /// Submits the current generation per camera, blending each record
    /// against its previous-generation match.
    ///
    /// `alpha` is the fixed-step accumulator fraction in `[0, 1)`; position
    /// and scale blend linearly, rotation spherically. A record with no
    /// previous match (it appeared this tick) submits its current snapshot
    /// untouched. Records whose material has stopped being ready since
    /// collection are skipped without disturbing the rest of the view.
    pub fn submit_interpolated(
        &mut self,
        scene: &Scene,
        cache: &AssetCache,
        alpha: f32,
        backend: &mut dyn RenderBackend,
    ) {
        self.stats.submitted = 0;
        self.stats.interpolated = 0;
        self.stats.rejected = 0;
        self.stats.triangles = 0;
        self.stats.views = 0;
        let alpha = alpha.clamp(0.0, 1.0);

        for (index, (camera_key, camera_node)) in
            self.sorted_cameras(scene).into_iter().enumerate()
        {
            let Some(camera) = scene.cameras.get(camera_key) else {
                continue;
            };
            let Some(node) = scene.nodes.get(camera_node) else {
                continue;
            };
            let view_id = index as ViewId;
            let world = *node.transform.world_matrix();
            let view = Camera::view_matrix(&world);
            let projection = camera
                .projection_matrix(self.viewport_aspect(camera.viewport.width, camera.viewport.height));
            backend.begin_view(
                view_id,
                &ViewSetup {
                    view,
                    projection,
                    viewport: camera.viewport,
                    clear: camera.clear,
                },
            );
            self.stats.views += 1;
            self.culler.update(view, projection);
            let mask = camera.layer_mask;

            self.store.for_each_pair(|call, previous| {
                if mask & call.layer == 0 {
                    self.stats.rejected += 1;
                    return;
                }
                if !cache.material_ready(call.material) {
                    return;
                }
                let (position, rotation, scale) = match previous {
                    Some(prev) => (
                        prev.position.lerp(call.position, alpha),
                        prev.rotation.slerp(call.rotation, alpha),
                        prev.scale.lerp(call.scale, alpha),
                    ),
                    None => (call.position, call.rotation, call.scale),
                };
                let world = Affine3A::from_scale_rotation_translation(scale, rotation, position);
                if self.culler.test_aabb(&call.bounds.transform(&world)) == Visibility::Invisible {
                    self.stats.rejected += 1;
                    return;
                }

                let mut state = RenderState::new(Mat4::from(world), call.geometry, call.material);
                if let Some(buffer) = call
                    .instance
                    .and_then(|key| scene.instances.get(key))
                    .and_then(|inst| inst.buffer())
                {
                    state.aux_buffers.push((AUX_BONE_MATRICES, buffer));
                }
                backend.submit(view_id, &state, call.triangles, 1);
                self.stats.submitted += 1;
                if previous.is_some() {
                    self.stats.interpolated += 1;
                }
                self.stats.triangles += u64::from(call.triangles);
            });
        }
    }

    /// Culls and submits live scene state per camera in one pass, skipping
    /// the draw-call store entirely. For drivers that run simulation and
    /// render at the same rate.
    pub fn submit_immediate(
        &mut self,
        scene: &mut Scene,
        cache: &AssetCache,
        backend: &mut dyn RenderBackend,
    ) {
        self.stats.submitted = 0;
        self.stats.interpolated = 0;
        self.stats.rejected = 0;
        self.stats.triangles = 0;
        self.stats.views = 0;

        let components: Vec<(NodeHandle, RenderableKey)> = scene
            .renderable_components
            .iter()
            .map(|(node, key)| (node, *key))
            .collect();

        for (index, (camera_key, camera_node)) in
            self.sorted_cameras(scene).into_iter().enumerate()
        {
            let Some(camera) = scene.cameras.get(camera_key) else {
                continue;
            };
            let Some(node) = scene.nodes.get(camera_node) else {
                continue;
            };
            let view_id = index as ViewId;
            let world = *node.transform.world_matrix();
            let view = Camera::view_matrix(&world);
            let projection = camera
                .projection_matrix(self.viewport_aspect(camera.viewport.width, camera.viewport.height));
            backend.begin_view(
                view_id,
                &ViewSetup {
                    view,
                    projection,
                    viewport: camera.viewport,
                    clear: camera.clear,
                },
            );
            self.stats.views += 1;
            self.culler.update(view, projection);
            let mask = camera.layer_mask;

            for &(node_handle, renderable_key) in &components {
                let Some(node) = scene.nodes.get(node_handle) else {
                    continue;
                };
                if !node.visible {
                    continue;
                }
                let layer = node.layer;
                let world = *node.transform.world_matrix();
                if mask & layer == 0 {
                    self.stats.rejected += 1;
                    continue;
                }
                let Some(renderable) = scene.renderables.get(renderable_key).copied() else {
                    continue;
                };
                if renderable.force_off || !cache.material_ready(renderable.material) {
                    continue;
                }

                let material = renderable.material;
                let (geometry, bounds, triangles, instance_key) = match renderable.kind {
                    RenderableKind::Mesh {
                        geometry,
                        bounds,
                        triangles,
                    } => (geometry, bounds, triangles, None),
                    RenderableKind::Skinned { mesh } => {
                        let Some(asset) = cache.skinned_mesh(mesh) else {
                            continue;
                        };
                        let instance_key =
                            instance::resolve_instance(scene, cache, node_handle, asset.skeleton);
                        if let Some(key) = instance_key
                            && let Some(inst) = scene.instances.get_mut(key)
                        {
                            inst.register_mesh(cache, mesh);
                        }
                        (mesh, asset.bounds, asset.triangles, instance_key)
                    }
                };

                if self.culler.test_aabb(&bounds.transform(&world)) == Visibility::Invisible {
                    self.stats.rejected += 1;
                    continue;
                }

                let mut state = RenderState::new(Mat4::from(world), geometry, material);
                if let Some(buffer) = instance_key
                    .and_then(|key| scene.instances.get(key))
                    .and_then(|inst| inst.buffer())
                {
                    state.aux_buffers.push((AUX_BONE_MATRICES, buffer));
                }
                backend.submit(view_id, &state, triangles, 1);
                self.stats.submitted += 1;
                self.stats.triangles += u64::from(triangles);
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Cameras in render order (ascending `order`, stable on ties).
    fn sorted_cameras(&self, scene: &Scene) -> Vec<(CameraKey, NodeHandle)> {
        let mut cameras: Vec<(CameraKey, NodeHandle)> = scene
            .camera_components
            .iter()
            .map(|(node, key)| (*key, node))
            .collect();
        cameras.sort_by_key(|(key, _)| scene.cameras.get(*key).map_or(0, |c| c.order));
        cameras
    }

    fn viewport_aspect(&self, viewport_width: f32, viewport_height: f32) -> f32 {
        let width = viewport_width * self.width as f32;
        let height = viewport_height * self.height as f32;
        if height <= f32::EPSILON {
            1.0
        } else {
            width / height
        }
    }
}
