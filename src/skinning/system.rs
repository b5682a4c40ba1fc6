use crate::assets::AssetCache;
use crate::render::backend::RenderBackend;
use crate::scene::Scene;

/// Skinning system.
///
/// Recomputes the bone-matrix palette of every skinned instance whose
/// skeleton moved and mirrors the result into the instance's GPU buffer,
/// throttled to each skeleton's authored sampling rate. Run after draw-call
/// collection has registered any new meshes and before render submission
/// reads the buffers.
pub struct SkinningSystem;

impl SkinningSystem {
    pub fn update(
        scene: &mut Scene,
        cache: &AssetCache,
        backend: &mut dyn RenderBackend,
        delta: f32,
        refresh_rate: u32,
    ) {
        let mut instances = std::mem::take(&mut scene.instances);

        for (_key, instance) in &mut instances {
            let interval = cache
                .skeleton(instance.asset)
                .map_or(0.0, |skeleton| skeleton.sample_interval(refresh_rate));
            instance.update(&scene.nodes, backend, delta, interval);
        }

        scene.instances = instances;
    }
}
