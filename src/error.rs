// ABOUTME: Error types for pcm-stream
// ABOUTME: Covers codec configuration, feed input validation, sink and lifecycle failures

use thiserror::Error;

/// Errors surfaced by the playback engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown codec name at configuration time. Fatal: the player cannot be
    /// built with a codec it does not recognize.
    #[error("unsupported codec `{0}`, expected one of: Int8, Int16, Int32, Float32")]
    UnsupportedCodec(String),

    /// The fed buffer cannot be interpreted under the configured codec
    /// (byte length not a multiple of the sample width). Raised synchronously
    /// from `feed` before anything is appended; player state is unaffected.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The player was destroyed; feeding it is rejected rather than ignored.
    #[error("player has been destroyed")]
    Destroyed,

    /// Audio sink construction or stream error.
    #[error("audio sink error: {0}")]
    Sink(String),

    /// A named processor stage failed to attach. The device sink constructs
    /// this for its warning log and continues without the stage; it is never
    /// returned from `DeviceSink::open`.
    #[error("failed to attach processor stage `{name}`: {reason}")]
    ProcessorAttachment {
        /// Name of the processor stage that failed.
        name: String,
        /// Underlying failure description.
        reason: String,
    },
}
