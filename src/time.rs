//! Frame timing.
//!
//! [`FrameClock`] tracks wall-clock deltas and drives the fixed-timestep
//! accumulator: simulation advances in fixed increments while rendering
//! happens at whatever rate the display allows, interpolating between the two
//! most recent simulation states by [`FrameClock::alpha`].

use std::time::Instant;

/// Timing configuration.
///
/// Plain data with sensible defaults; override fields as needed:
///
/// ```rust
/// use marionette::time::ClockSettings;
///
/// let settings = ClockSettings {
///     fixed_delta: 1.0 / 30.0,
///     ..ClockSettings::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClockSettings {
    /// Duration of one simulation tick in seconds.
    pub fixed_delta: f32,
    /// Upper bound on fixed steps executed per frame. Time beyond the bound
    /// is dropped so a long stall cannot snowball into ever-longer frames.
    pub max_steps_per_frame: u32,
    /// Display refresh rate in Hz, used by sampling throttles that request
    /// sync-to-refresh.
    pub refresh_rate: u32,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            fixed_delta: 1.0 / 60.0,
            max_steps_per_frame: 8,
            refresh_rate: 60,
        }
    }
}

/// Tracks frame deltas and the fixed-step accumulator.
pub struct FrameClock {
    settings: ClockSettings,
    last_update: Instant,
    /// Wall-clock time of the last frame in seconds.
    pub delta: f32,
    accumulator: f32,
    /// Total number of frames begun.
    pub frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Creates a clock with default settings, starting from now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(ClockSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: ClockSettings) -> Self {
        Self {
            settings,
            last_update: Instant::now(),
            delta: 0.0,
            accumulator: 0.0,
            frame_count: 0,
        }
    }

    /// Begins a frame from the wall clock.
    ///
    /// Returns the number of fixed simulation steps to run this frame.
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;
        self.advance(delta)
    }

    /// Advances the accumulator by an explicit delta.
    ///
    /// Same bookkeeping as [`begin_frame`](Self::begin_frame) with the wall
    /// clock taken out, which keeps simulations and tests deterministic.
    pub fn advance(&mut self, delta: f32) -> u32 {
        self.delta = delta;
        self.frame_count += 1;
        self.accumulator += delta;

        let full_steps = (self.accumulator / self.settings.fixed_delta) as u32;
        let steps = full_steps.min(self.settings.max_steps_per_frame);
        // Consume all whole steps even when clamped: dropped time is lost,
        // not carried into the next frame.
        self.accumulator -= full_steps as f32 * self.settings.fixed_delta;
        steps
    }

    /// Blend factor between the previous and current simulation states,
    /// in `[0, 1)`.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.settings.fixed_delta
    }

    /// Duration of one simulation tick in seconds.
    #[inline]
    #[must_use]
    pub fn fixed_delta(&self) -> f32 {
        self.settings.fixed_delta
    }

    /// Display refresh rate in Hz.
    #[inline]
    #[must_use]
    pub fn refresh_rate(&self) -> u32 {
        self.settings.refresh_rate
    }
}
