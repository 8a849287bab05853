// ABOUTME: Audio sink abstraction consumed by the playback engine
// ABOUTME: Device-backed, filter, and deterministic mock implementations

use crate::audio::{BlockId, PlaybackBlock};
use crate::config::PlayerConfig;
use crate::error::Error;
use std::time::Duration;

/// Real output device sink built on cpal
pub mod device;
/// Biquad filter stage used by the device sink
pub mod filter;
/// Deterministic sink with a manual clock for tests and offline use
pub mod mock;

pub use device::DeviceSink;
pub use filter::Biquad;
pub use mock::{MockSink, MockSinkHandle, ScheduledBlock};

/// Where scheduled blocks go to become sound.
///
/// The engine owns exactly one sink per lifecycle generation and drives it
/// from the flush scheduler thread; implementations only need interior
/// thread-safety if they share state with a render thread of their own.
pub trait AudioSink: Send {
    /// Monotonic playback clock. Frozen while suspended.
    fn now(&self) -> Duration;

    /// Schedule a block to begin at an absolute time on this sink's clock.
    fn schedule(&mut self, block: PlaybackBlock, at: Duration) -> Result<BlockId, Error>;

    /// Drain completion notifications for blocks that finished playing
    /// (or were stopped) since the last call.
    fn take_finished(&mut self) -> Vec<BlockId>;

    /// Stop one scheduled block. Unknown or already-finished ids are no-ops.
    fn stop(&mut self, id: BlockId);

    /// Stop every scheduled block.
    fn stop_all(&mut self);

    /// Set the gain multiplier.
    fn set_gain(&mut self, gain: f32);

    /// Current gain multiplier.
    fn gain(&self) -> f32;

    /// Freeze the playback clock; blocks in progress suspend with it.
    fn suspend(&mut self);

    /// Unfreeze the playback clock.
    fn resume(&mut self);
}

/// Builds a fresh sink for a lifecycle generation. Called at construction and
/// again on every `refresh`.
pub type SinkFactory = Box<dyn FnMut(&PlayerConfig) -> Result<Box<dyn AudioSink>, Error> + Send>;
