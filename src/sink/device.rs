// ABOUTME: cpal-backed audio sink rendering scheduled blocks sample-accurately
// ABOUTME: Frame-counter clock owned by the render callback, frozen while suspended

use crate::audio::gain::GainRamp;
use crate::audio::{BlockId, GainControl, PlaybackBlock};
use crate::config::{PlayerConfig, ProcessStage, ProcessorModule};
use crate::error::Error;
use crate::sink::{AudioSink, Biquad};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam::channel::{bounded, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

struct Scheduled {
    id: BlockId,
    start_frame: u64,
    block: PlaybackBlock,
}

impl Scheduled {
    fn end_frame(&self) -> u64 {
        self.start_frame + self.block.frames() as u64
    }
}

#[derive(Default)]
struct RenderState {
    /// Frames rendered since the sink opened. Not advanced while suspended,
    /// so this is the playback clock.
    clock_frames: u64,
    /// Blocks sorted by start frame. The engine chains starts back-to-back,
    /// so at most the front block is audible at any instant.
    scheduled: Vec<Scheduled>,
    next_id: u64,
    finished: Vec<BlockId>,
    suspended: bool,
}

/// Real audio output via the default cpal device.
///
/// The `cpal::Stream` is owned by a dedicated host thread (streams are not
/// `Send`); the sink itself only holds the state shared with the render
/// callback, so it can live inside the engine and move between threads.
pub struct DeviceSink {
    state: Arc<Mutex<RenderState>>,
    gain: GainControl,
    sample_rate: u32,
    last_error: Arc<Mutex<Option<String>>>,
    shutdown_tx: Sender<()>,
    host_thread: Option<JoinHandle<()>>,
}

impl DeviceSink {
    /// Open the default output device for the given configuration.
    ///
    /// Builds the processing chain the configuration asks for: optional
    /// biquad filter stage, gain ramp, optional custom processor stage. A
    /// processor whose factory fails is logged and omitted; the sink still
    /// opens.
    pub fn open(config: &PlayerConfig) -> Result<Self, Error> {
        let channels = config.channels.max(1);
        let sample_rate = config.sample_rate;
        let gain = GainControl::new(config.volume);

        if let Some(analyser) = &config.analyser {
            // Pass-through parameters; this sink has no analysis node.
            log::debug!(
                "analyser params (fft_size={}) not consumed by DeviceSink",
                analyser.fft_size
            );
        }

        let filters: Option<Vec<Biquad>> = config
            .filter
            .as_ref()
            .map(|params| vec![Biquad::new(params, sample_rate); channels]);

        let process: Option<ProcessStage> = config
            .processor
            .as_ref()
            .and_then(|module| build_process_stage(module, sample_rate, channels));

        let state = Arc::new(Mutex::new(RenderState::default()));
        let last_error = Arc::new(Mutex::new(None));
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (ready_tx, ready_rx) = bounded::<Result<(), Error>>(1);

        let cb_state = Arc::clone(&state);
        let cb_gain = gain.clone();
        let cb_error = Arc::clone(&last_error);

        // The stream must be created and dropped on the same thread; park it
        // there until shutdown.
        let host_thread = std::thread::Builder::new()
            .name("pcm-stream-device".into())
            .spawn(move || {
                let stream = match build_stream(
                    channels,
                    sample_rate,
                    cb_state,
                    cb_gain,
                    filters,
                    process,
                    Arc::clone(&cb_error),
                ) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(Error::Sink(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));
                // Blocks until the sink shuts down or is dropped.
                let _ = shutdown_rx.recv();
            })
            .map_err(|e| Error::Sink(format!("failed to spawn device thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = host_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = host_thread.join();
                return Err(Error::Sink("device thread exited during setup".into()));
            }
        }

        Ok(Self {
            state,
            gain,
            sample_rate,
            last_error,
            shutdown_tx,
            host_thread: Some(host_thread),
        })
    }

    /// Last error reported by the stream callback, if any, clearing it.
    pub fn take_error(&self) -> Option<String> {
        self.last_error.lock().take()
    }

    fn frames_to_duration(&self, frames: u64) -> Duration {
        Duration::from_nanos(frames * 1_000_000_000 / self.sample_rate.max(1) as u64)
    }

    fn duration_to_frames(&self, at: Duration) -> u64 {
        (at.as_nanos() * self.sample_rate as u128 / 1_000_000_000) as u64
    }
}

impl AudioSink for DeviceSink {
    fn now(&self) -> Duration {
        let frames = self.state.lock().clock_frames;
        self.frames_to_duration(frames)
    }

    fn schedule(&mut self, block: PlaybackBlock, at: Duration) -> Result<BlockId, Error> {
        let start_frame = self.duration_to_frames(at);
        let mut state = self.state.lock();
        let id = BlockId(state.next_id);
        state.next_id += 1;
        let entry = Scheduled {
            id,
            start_frame,
            block,
        };
        let pos = state
            .scheduled
            .binary_search_by_key(&start_frame, |s| s.start_frame)
            .unwrap_or_else(|e| e);
        state.scheduled.insert(pos, entry);
        Ok(id)
    }

    fn take_finished(&mut self) -> Vec<BlockId> {
        std::mem::take(&mut self.state.lock().finished)
    }

    fn stop(&mut self, id: BlockId) {
        let mut state = self.state.lock();
        if let Some(pos) = state.scheduled.iter().position(|s| s.id == id) {
            state.scheduled.remove(pos);
            state.finished.push(id);
        }
    }

    fn stop_all(&mut self) {
        let mut state = self.state.lock();
        let remaining: Vec<BlockId> = state.scheduled.drain(..).map(|s| s.id).collect();
        state.finished.extend(remaining);
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain.set_gain(gain);
    }

    fn gain(&self) -> f32 {
        self.gain.gain()
    }

    fn suspend(&mut self) {
        self.state.lock().suspended = true;
    }

    fn resume(&mut self) {
        self.state.lock().suspended = false;
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.host_thread.take() {
            let _ = handle.join();
        }
    }
}

fn build_stream(
    channels: usize,
    sample_rate: u32,
    state: Arc<Mutex<RenderState>>,
    gain: GainControl,
    mut filters: Option<Vec<Biquad>>,
    mut process: Option<ProcessStage>,
    error_sink: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream, Error> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Sink("no output device available".to_string()))?;

    let config = StreamConfig {
        channels: channels as u16,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut ramp = GainRamp::new(sample_rate, gain.gain());

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let target = gain.gain();
                let frames = data.len() / channels.max(1);

                {
                    let mut st = state.lock();
                    if st.suspended {
                        data.fill(0.0);
                        drop(st);
                        ramp.advance(frames, target);
                        run_post_stages(data, channels, &mut filters, &mut process);
                        return;
                    }

                    for frame in data.chunks_mut(channels) {
                        let t = st.clock_frames;

                        // Retire blocks entirely behind the clock.
                        while let Some(first) = st.scheduled.first() {
                            if first.end_frame() <= t {
                                let done = st.scheduled.remove(0);
                                st.finished.push(done.id);
                            } else {
                                break;
                            }
                        }

                        match st.scheduled.first() {
                            Some(first) if first.start_frame <= t => {
                                let offset = (t - first.start_frame) as usize;
                                for (ch, sample) in frame.iter_mut().enumerate() {
                                    *sample = first
                                        .block
                                        .channel(ch.min(first.block.channel_count() - 1))
                                        [offset];
                                }
                            }
                            _ => frame.fill(0.0),
                        }
                        st.clock_frames += 1;
                    }
                } // state lock dropped before gain/filter/process stages

                ramp.apply(data, channels, target);
                run_post_stages(data, channels, &mut filters, &mut process);
            },
            move |err| {
                log::warn!("audio stream error: {err}");
                *error_sink.lock() = Some(err.to_string());
            },
            None,
        )
        .map_err(|e| Error::Sink(e.to_string()))?;

    Ok(stream)
}

/// Run a processor module's factory. Attachment failure is non-fatal: the
/// error is logged and the stage omitted.
fn build_process_stage(
    module: &ProcessorModule,
    sample_rate: u32,
    channels: usize,
) -> Option<ProcessStage> {
    match (module.factory)(sample_rate, channels) {
        Ok(stage) => Some(stage),
        Err(e) => {
            let err = Error::ProcessorAttachment {
                name: module.name.clone(),
                reason: e.to_string(),
            };
            log::warn!("{err}; continuing without the stage");
            None
        }
    }
}

fn run_post_stages(
    data: &mut [f32],
    channels: usize,
    filters: &mut Option<Vec<Biquad>>,
    process: &mut Option<ProcessStage>,
) {
    if let Some(filters) = filters {
        for (i, sample) in data.iter_mut().enumerate() {
            *sample = filters[i % channels].process(*sample);
        }
    }
    if let Some(stage) = process {
        stage(data);
    }
}
