// ABOUTME: Append-only accumulator for normalized interleaved samples
// ABOUTME: Deque-of-chunks storage keeps append amortized O(1) and drain O(chunks)

use std::collections::VecDeque;
use std::time::Duration;

/// Buffer of normalized, channel-interleaved samples awaiting playback.
///
/// Committed length is always a multiple of the channel count: a chunk that
/// ends mid-frame leaves its trailing samples in a carry that is committed
/// once the frame completes on a later append.
#[derive(Debug)]
pub struct SampleAccumulator {
    chunks: VecDeque<Vec<f32>>,
    committed: usize,
    carry: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl SampleAccumulator {
    /// Create an empty accumulator for the given channel layout.
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        debug_assert!(channels > 0, "channels must be > 0");
        Self {
            chunks: VecDeque::new(),
            committed: 0,
            carry: Vec::new(),
            channels: channels.max(1),
            sample_rate,
        }
    }

    /// Append decoded samples after everything already buffered.
    ///
    /// Pushes one chunk onto the deque instead of reallocating a single
    /// contiguous buffer, so feeding many small chunks stays linear in total
    /// samples fed.
    pub fn append(&mut self, mut samples: Vec<f32>) {
        if !self.carry.is_empty() {
            let mut merged = std::mem::take(&mut self.carry);
            merged.append(&mut samples);
            samples = merged;
        }
        let remainder = samples.len() % self.channels;
        if remainder != 0 {
            self.carry = samples.split_off(samples.len() - remainder);
        }
        if !samples.is_empty() {
            self.committed += samples.len();
            self.chunks.push_back(samples);
        }
    }

    /// Take the entire committed sequence, leaving the accumulator empty.
    ///
    /// Partial-frame carry stays behind so the invariant holds for the
    /// returned buffer as well as for what remains.
    pub fn drain_all(&mut self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.committed);
        for chunk in self.chunks.drain(..) {
            out.extend_from_slice(&chunk);
        }
        self.committed = 0;
        out
    }

    /// Discard everything, including any partial-frame carry.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.committed = 0;
        self.carry.clear();
    }

    /// Committed interleaved sample count (always a multiple of channels).
    pub fn len(&self) -> usize {
        self.committed
    }

    /// Whether nothing is committed.
    pub fn is_empty(&self) -> bool {
        self.committed == 0
    }

    /// Playback duration of the committed samples.
    pub fn buffered_duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.committed / self.channels;
        Duration::from_nanos(frames as u64 * 1_000_000_000 / self.sample_rate as u64)
    }
}
