// ABOUTME: Audio types and processing for pcm-stream
// ABOUTME: Codec/PlaybackBlock definitions, PCM decoding, accumulation, fades, gain

/// Append-only sample accumulator with partial-frame carry
pub mod accumulator;
/// PCM decoder normalizing input codecs to f32
pub mod decode;
/// Edge-fade shaper applied at block boundaries
pub mod fade;
/// Lock-free gain control and per-frame ramping
pub mod gain;
/// Core audio type definitions (Codec, PlaybackBlock, BlockId)
pub mod types;

pub use accumulator::SampleAccumulator;
pub use decode::PcmDecoder;
pub use fade::{apply_edge_fade, FADE_FRAMES};
pub use gain::{GainControl, MAX_GAIN};
pub use types::{BlockId, Codec, PlaybackBlock};
