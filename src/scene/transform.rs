use glam::{Affine3A, Mat4, Quat, Vec3};

/// Position, rotation, and scale with cached matrices and change tracking.
///
/// Writing the public TRS fields does not recompute anything by itself; the
/// transform system compares them against a private shadow copy during the
/// hierarchy pass and only rebuilds matrices that actually changed.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    // === Matrix caches ===
    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    // === Shadow state for dirty checking ===
    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,

    /// Whether the world matrix was rewritten during the most recent
    /// hierarchy update.
    pub(crate) changed: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,

            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,

            changed: false,
        }
    }

    /// Recomputes the local matrix when the TRS fields differ from the
    /// shadow state. Returns whether a recompute happened.
    pub(crate) fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix = Affine3A::from_scale_rotation_translation(
                self.scale,
                self.rotation,
                self.position,
            );

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    /// Whether the world matrix was rewritten by the most recent hierarchy
    /// update. Consumers that cache derived data (bone matrices, draw
    /// snapshots) can use this to skip work.
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// World matrix for CPU-side reads (bone composition, attachments).
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// World matrix widened to `Mat4` for hand-off to a renderer.
    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }

    pub(crate) fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Forces a matrix rebuild on the next hierarchy update, even when the
    /// TRS fields look unchanged (reparenting, teleports through shadows).
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
