// ABOUTME: Core audio type definitions (Codec, PlaybackBlock, BlockId)
// ABOUTME: Blocks are immutable de-interleaved buffers handed to the sink

use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;

/// Input sample encoding for fed buffers.
///
/// Integer codecs are normalized by dividing each raw sample by the codec's
/// full-scale magnitude; `Float32` passes through unchanged. Multi-byte
/// formats are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Signed 8-bit integer, full scale 128.
    Int8,
    /// Signed 16-bit integer, full scale 32768.
    Int16,
    /// Signed 32-bit integer, full scale 2147483648.
    Int32,
    /// IEEE 754 32-bit float, already normalized.
    Float32,
}

impl Codec {
    /// Resolve a codec from its configuration name.
    ///
    /// Fails with [`Error::UnsupportedCodec`] for anything but the four
    /// recognized names. This is the configuration-time fail-fast gate.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "Int8" => Ok(Codec::Int8),
            "Int16" => Ok(Codec::Int16),
            "Int32" => Ok(Codec::Int32),
            "Float32" => Ok(Codec::Float32),
            other => Err(Error::UnsupportedCodec(other.to_string())),
        }
    }

    /// Width of one encoded sample in bytes.
    pub fn sample_width(&self) -> usize {
        match self {
            Codec::Int8 => 1,
            Codec::Int16 => 2,
            Codec::Int32 | Codec::Float32 => 4,
        }
    }

    /// Full-scale magnitude used to normalize raw integer samples.
    pub fn full_scale(&self) -> f32 {
        match self {
            Codec::Int8 => 128.0,
            Codec::Int16 => 32_768.0,
            Codec::Int32 => 2_147_483_648.0,
            Codec::Float32 => 1.0,
        }
    }
}

/// Identifier of a block scheduled on a sink, used for completion tracking
/// and positive stop on destroy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u64);

/// One flush worth of audio: de-interleaved per-channel samples at a fixed
/// sample rate. Immutable once built; the engine only keeps the [`BlockId`]
/// the sink hands back.
#[derive(Debug, Clone)]
pub struct PlaybackBlock {
    channels: Arc<[Box<[f32]>]>,
    sample_rate: u32,
}

impl PlaybackBlock {
    /// Build a block from per-channel sample buffers.
    ///
    /// All channels must have equal length; violations are a programming
    /// error in the flush path and are caught by a debug assertion.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(!channels.is_empty(), "block must have at least one channel");
        debug_assert!(
            channels.windows(2).all(|w| w[0].len() == w[1].len()),
            "all channels must have the same frame count"
        );
        let channels: Vec<Box<[f32]>> = channels.into_iter().map(Vec::into_boxed_slice).collect();
        Self {
            channels: Arc::from(channels.into_boxed_slice()),
            sample_rate,
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples of one channel.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback duration of this block.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.frames() as u64 * 1_000_000_000 / self.sample_rate as u64)
    }
}
