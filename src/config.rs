// ABOUTME: Player configuration and sink pass-through parameter types
// ABOUTME: Built once per lifecycle generation and replaced wholesale on refresh

use crate::audio::Codec;
use crate::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Post-gain processing stage attached to the device sink.
///
/// Receives `&mut [f32]` (interleaved, after gain is applied) on **every**
/// render callback, including silence. It must not block, allocate, or panic;
/// it runs on the audio callback thread.
pub type ProcessStage = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Second-order filter shapes supported by the sink's filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Attenuate above the corner frequency.
    LowPass,
    /// Attenuate below the corner frequency.
    HighPass,
    /// Pass a band around the center frequency.
    BandPass,
    /// Reject a band around the center frequency.
    Notch,
    /// Boost or cut around the center frequency by `gain_db`.
    Peaking,
    /// Boost or cut everything below the corner frequency by `gain_db`.
    LowShelf,
    /// Boost or cut everything above the corner frequency by `gain_db`.
    HighShelf,
}

/// Parameters for the optional filter stage, passed through to the sink.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct FilterParams {
    /// Filter shape.
    pub filter_type: FilterType,
    /// Corner / center frequency in Hz.
    pub frequency: f32,
    /// Resonance / bandwidth control.
    #[builder(default = 1.0)]
    pub q: f32,
    /// Gain in dB for peaking and shelving types; ignored by the others.
    #[builder(default = 0.0)]
    pub gain_db: f32,
    /// Frequency detune in cents applied on top of `frequency`.
    #[builder(default = 0.0)]
    pub detune_cents: f32,
}

impl FilterParams {
    /// Effective frequency after detune.
    pub fn detuned_frequency(&self) -> f32 {
        self.frequency * (self.detune_cents / 1200.0).exp2()
    }
}

/// Analysis-node parameters. The engine never interprets these; they are
/// handed to the sink factory for consumers that wire up spectral analysis.
#[derive(Debug, Clone, Copy)]
pub struct AnalyserParams {
    /// FFT window size the downstream analyser should use.
    pub fft_size: u32,
}

/// Named factory for a custom processing stage.
///
/// The factory runs once per sink construction (so once per lifecycle
/// generation). A failing factory is non-fatal: the device sink logs the
/// failure and continues without the stage.
#[derive(Clone)]
pub struct ProcessorModule {
    /// Name used in logs when attachment fails.
    pub name: String,
    /// Builds the stage for a sink rendering at the given sample rate and
    /// channel count.
    pub factory: Arc<dyn Fn(u32, usize) -> Result<ProcessStage, Error> + Send + Sync>,
}

impl ProcessorModule {
    /// Create a module from a name and a stage factory.
    pub fn new(
        name: impl Into<String>,
        factory: impl Fn(u32, usize) -> Result<ProcessStage, Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }
}

impl fmt::Debug for ProcessorModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Engine configuration, immutable per lifecycle generation.
///
/// `refresh` replaces the whole record, carrying the live volume over into
/// the next generation.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PlayerConfig {
    /// Encoding of fed buffers.
    #[builder(default = Codec::Int16)]
    pub codec: Codec,
    /// Channel count of the interleaved input (must be >= 1).
    #[builder(default = 1)]
    pub channels: usize,
    /// Sample rate in Hz.
    #[builder(default = 8000)]
    pub sample_rate: u32,
    /// Period of the flush scheduler.
    #[builder(default = Duration::from_millis(1000))]
    pub flush_interval: Duration,
    /// Minimum buffered duration before first playback.
    #[builder(default = Duration::from_millis(500))]
    pub cache_duration: Duration,
    /// Initial gain multiplier.
    #[builder(default = 1.0)]
    pub volume: f32,
    /// Analyser parameters passed through to the sink factory.
    #[builder(default = None, setter(strip_option))]
    pub analyser: Option<AnalyserParams>,
    /// Optional filter stage parameters.
    #[builder(default = None, setter(strip_option))]
    pub filter: Option<FilterParams>,
    /// Optional custom processing stage.
    #[builder(default = None, setter(strip_option))]
    pub processor: Option<ProcessorModule>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
