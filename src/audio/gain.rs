// ABOUTME: Lock-free volume control for the device sink
// ABOUTME: Atomic gain target plus a per-frame ramp to avoid clicks on changes

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Upper bound for the gain multiplier. Values above unity amplify; anything
/// past 4x is clamped to protect the output stage.
pub const MAX_GAIN: f32 = 4.0;

/// Shared gain control for a device sink.
///
/// All methods are lock-free and safe to call from any thread, including the
/// audio callback. Cloning is cheap (single `Arc` increment).
#[derive(Clone)]
pub struct GainControl {
    target_gain_bits: Arc<AtomicU32>,
}

impl GainControl {
    /// Create a control at the given initial gain multiplier.
    pub(crate) fn new(gain: f32) -> Self {
        Self {
            target_gain_bits: Arc::new(AtomicU32::new(sanitize(gain).to_bits())),
        }
    }

    /// Set the gain multiplier. Negative and non-finite values become 0,
    /// values above [`MAX_GAIN`] are clamped.
    pub fn set_gain(&self, gain: f32) {
        self.target_gain_bits
            .store(sanitize(gain).to_bits(), Ordering::Relaxed);
    }

    /// Read the current gain target.
    pub fn gain(&self) -> f32 {
        let gain = f32::from_bits(self.target_gain_bits.load(Ordering::Relaxed));
        // NaN is unordered, so `clamp` would propagate it unchanged. Fail safe
        // to silence rather than letting NaN poison the entire gain ramp.
        if !gain.is_finite() {
            return 0.0;
        }
        gain.clamp(0.0, MAX_GAIN)
    }
}

fn sanitize(gain: f32) -> f32 {
    if !gain.is_finite() {
        return 0.0;
    }
    gain.clamp(0.0, MAX_GAIN)
}

impl fmt::Debug for GainControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GainControl")
            .field("gain", &self.gain())
            .finish()
    }
}

/// Per-frame gain ramp to avoid clicks on gain changes.
///
/// Operates per-frame (not per-sample) so ramp duration is independent of
/// channel count. All samples within a frame get the same gain value.
pub(crate) struct GainRamp {
    /// Number of frames over which to ramp (20ms worth at the configured
    /// sample rate). Zero for very low sample rates; changes snap instantly.
    ramp_duration_frames: u32,
    current_gain: f32,
    ramp_frames_remaining: u32,
    ramp_step: f32,
    last_target: f32,
}

impl GainRamp {
    /// Create a ramp with a 20ms transition at the given sample rate.
    ///
    /// `initial_gain` sets both the applied gain and the target so the first
    /// callback uses the correct value without ramping.
    pub(crate) fn new(sample_rate: u32, initial_gain: f32) -> Self {
        let gain = sanitize(initial_gain);
        Self {
            ramp_duration_frames: sample_rate / 50, // 20ms = 1/50th of a second
            current_gain: gain,
            ramp_frames_remaining: 0,
            ramp_step: 0.0,
            last_target: gain,
        }
    }

    /// Update ramp state for `frames` frames without touching any buffer.
    ///
    /// Keeps the ramp synchronized through silent periods (suspension,
    /// schedule gaps) without paying for per-sample multiplies on zeros.
    pub(crate) fn advance(&mut self, frames: usize, target: f32) {
        if frames == 0 {
            return;
        }
        self.update_target(target);

        let advance = u32::try_from(frames)
            .unwrap_or(u32::MAX)
            .min(self.ramp_frames_remaining);
        if advance > 0 {
            self.current_gain += self.ramp_step * advance as f32;
            self.ramp_frames_remaining -= advance;
            if self.ramp_frames_remaining == 0 {
                self.current_gain = target;
            } else {
                self.current_gain = self.current_gain.clamp(0.0, MAX_GAIN);
            }
        }
    }

    /// Apply gain to an interleaved f32 buffer.
    ///
    /// The ramp step is applied before each frame's samples, and the final
    /// ramp frame snaps to `target` exactly; the one-frame offset is
    /// inaudible at typical rates and keeps `apply` consistent with
    /// [`Self::advance`].
    pub(crate) fn apply(&mut self, data: &mut [f32], channels: usize, target: f32) {
        if data.is_empty() || channels == 0 {
            // Early return *before* updating last_target: an empty buffer must
            // not commit a target change, or the next real call would compute
            // the ramp step from a stale current_gain.
            return;
        }
        debug_assert!(
            data.len() % channels == 0,
            "buffer length must be a multiple of channels"
        );

        self.update_target(target);

        // Fast path: skip per-sample multiply when gain is unity and stable.
        if self.ramp_frames_remaining == 0 && self.current_gain == 1.0 {
            return;
        }

        let frames = data.len() / channels;
        let ramp_frames = (self.ramp_frames_remaining as usize).min(frames);

        // Ramp region: per-frame gain stepping.
        let (ramp_data, steady_data) = data.split_at_mut(ramp_frames * channels);
        for frame in ramp_data.chunks_mut(channels) {
            self.current_gain += self.ramp_step;
            self.ramp_frames_remaining -= 1;
            if self.ramp_frames_remaining == 0 {
                self.current_gain = target;
            }
            for sample in frame.iter_mut() {
                *sample *= self.current_gain;
            }
        }
        // Clamp once after the ramp region to bound FP accumulation error.
        if ramp_frames > 0 && self.ramp_frames_remaining > 0 {
            self.current_gain = self.current_gain.clamp(0.0, MAX_GAIN);
        }

        // Steady-state region: constant gain, SIMD-friendly.
        let gain = self.current_gain;
        if gain == 0.0 {
            // memset is faster than N fmuls when silenced.
            steady_data.fill(0.0);
        } else if gain != 1.0 {
            for sample in steady_data.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Detect a target change and (re)start the ramp if needed.
    fn update_target(&mut self, target: f32) {
        if !target.is_finite() {
            return;
        }
        if target.to_bits() != self.last_target.to_bits() {
            if self.ramp_duration_frames == 0 {
                self.current_gain = target;
            } else {
                self.ramp_frames_remaining = self.ramp_duration_frames;
                self.ramp_step = (target - self.current_gain) / self.ramp_duration_frames as f32;
            }
            self.last_target = target;
        }
    }
}
