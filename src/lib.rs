// ABOUTME: Gapless streaming PCM playback engine
// ABOUTME: Feed raw sample chunks, get sample-accurately chained audio output

//! Streaming PCM playback with gapless block chaining.
//!
//! Raw PCM chunks fed through [`PcmPlayer::feed`] are decoded, buffered, and
//! periodically flushed into blocks scheduled back-to-back on an audio sink
//! clock, so a continuous stream plays without gaps even though it arrives
//! in arbitrary chunk sizes. Block edges get short fades to suppress
//! boundary clicks; an initial cache gate delays the first playback until
//! enough audio is buffered to ride out network jitter.
//!
//! ```no_run
//! use pcm_stream::{Codec, PcmPlayer, PlayerConfig};
//!
//! # fn main() -> Result<(), pcm_stream::Error> {
//! let player = PcmPlayer::with_device(
//!     PlayerConfig::builder()
//!         .codec(Codec::Int16)
//!         .channels(2)
//!         .sample_rate(44_100)
//!         .build(),
//! )?;
//!
//! player.feed(&incoming_chunk())?;
//! player.play();
//! # Ok(())
//! # }
//! # fn incoming_chunk() -> Vec<u8> { Vec::new() }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod player;
pub mod sink;

mod timer;

pub use audio::{BlockId, Codec, PlaybackBlock};
pub use config::{
    AnalyserParams, FilterParams, FilterType, PlayerConfig, ProcessStage, ProcessorModule,
};
pub use error::Error;
pub use events::{EventBus, PlayerEvent, Subscription};
pub use player::{PcmPlayer, PlaybackState, RefreshOptions};
pub use sink::{AudioSink, DeviceSink, MockSink, MockSinkHandle, SinkFactory};
