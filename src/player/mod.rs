// ABOUTME: The streaming playback engine: feed/play/pause/resume/refresh/destroy
// ABOUTME: Flush scheduler chains blocks on the sink clock with edge fades between

use crate::audio::{apply_edge_fade, BlockId, PcmDecoder, PlaybackBlock, SampleAccumulator};
use crate::config::PlayerConfig;
use crate::error::Error;
use crate::events::{EventBus, PlayerEvent};
use crate::sink::{AudioSink, DeviceSink, SinkFactory};
use crate::timer::RepeatingTask;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// How often the cache gate is polled before first playback.
const CACHE_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Lifecycle state of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Initial state; playback has never been requested.
    NotPlayed,
    /// Playing (or waiting on the cache gate after `play()`).
    Played,
    /// Suspended by `pause()`.
    Paused,
}

/// Options for [`PcmPlayer::refresh`].
#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    /// Call `play()` immediately after reinitializing.
    pub play_after: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self { play_after: true }
    }
}

/// Per-generation engine state shared with the timer threads.
struct EngineState {
    accumulator: SampleAccumulator,
    /// When the next block should begin on the sink clock. Advanced by each
    /// block's duration; only ever snapped forward.
    cursor: Duration,
    current: Option<BlockId>,
    history: Vec<BlockId>,
    sink: Option<Box<dyn AudioSink>>,
    state: PlaybackState,
    /// Set once the cache gate opens; the gate is never consulted again
    /// within a generation.
    gate_latched: bool,
    destroyed: bool,
    channels: usize,
    sample_rate: u32,
    cache_duration: Duration,
}

impl EngineState {
    fn new(config: &PlayerConfig, sink: Box<dyn AudioSink>) -> Self {
        let channels = config.channels.max(1);
        Self {
            accumulator: SampleAccumulator::new(channels, config.sample_rate),
            cursor: Duration::ZERO,
            current: None,
            history: Vec::new(),
            sink: Some(sink),
            state: PlaybackState::NotPlayed,
            gate_latched: false,
            destroyed: false,
            channels,
            sample_rate: config.sample_rate,
            cache_duration: config.cache_duration,
        }
    }

    fn cache_ready(&self) -> bool {
        self.accumulator.buffered_duration() >= self.cache_duration
    }
}

/// Timer handles for the current generation. `torn_down` blocks late task
/// starts racing a destroy.
struct TaskSlots {
    flush: Option<RepeatingTask>,
    poll: Option<RepeatingTask>,
    torn_down: bool,
}

/// Streaming PCM playback engine.
///
/// Feed it raw chunks in the configured codec; once enough audio is buffered
/// (the cache gate) it slices the backlog into edge-faded blocks on a fixed
/// flush period and schedules them back-to-back on the sink clock, so
/// consecutive blocks play gaplessly.
///
/// All methods take `&self`; internal state is shared with the flush and
/// cache-poll timer threads behind mutexes.
pub struct PcmPlayer {
    config: Mutex<PlayerConfig>,
    decoder: PcmDecoder,
    engine: Arc<Mutex<EngineState>>,
    tasks: Arc<Mutex<TaskSlots>>,
    events: EventBus,
    factory: Mutex<SinkFactory>,
}

impl PcmPlayer {
    /// Create a player with an injected sink factory.
    ///
    /// The factory runs once now and again on every [`refresh`](Self::refresh);
    /// it receives the generation's configuration (including the volume to
    /// start at) and returns the sink that generation plays into.
    pub fn new(config: PlayerConfig, mut factory: SinkFactory) -> Result<Self, Error> {
        let sink = factory(&config)?;
        let decoder = PcmDecoder::new(config.codec);
        let engine = EngineState::new(&config, sink);
        Ok(Self {
            config: Mutex::new(config),
            decoder,
            engine: Arc::new(Mutex::new(engine)),
            tasks: Arc::new(Mutex::new(TaskSlots {
                flush: None,
                poll: None,
                torn_down: false,
            })),
            events: EventBus::new(),
            factory: Mutex::new(factory),
        })
    }

    /// Create a player playing into the default output device.
    pub fn with_device(config: PlayerConfig) -> Result<Self, Error> {
        Self::new(
            config,
            Box::new(|cfg| DeviceSink::open(cfg).map(|s| Box::new(s) as Box<dyn AudioSink>)),
        )
    }

    /// The event bus for lifecycle notifications.
    ///
    /// Subscriptions survive [`refresh`](Self::refresh) and are cleared by
    /// `destroy(true)`.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Ingest one chunk: decode under the configured codec and append to the
    /// buffered samples.
    ///
    /// Fails with [`Error::Destroyed`] after destroy and with
    /// [`Error::UnsupportedInput`] for buffers the codec cannot interpret;
    /// in both cases nothing is appended.
    pub fn feed(&self, data: &[u8]) -> Result<(), Error> {
        let mut engine = self.engine.lock();
        if engine.destroyed {
            return Err(Error::Destroyed);
        }
        let samples = self.decoder.decode(data)?;
        engine.accumulator.append(samples);
        Ok(())
    }

    /// Request playback.
    ///
    /// If the cache gate is already satisfied, flushing starts immediately
    /// (first flush synchronous, then periodic). Otherwise a poll task starts
    /// flushing exactly once when the gate opens, then cancels itself.
    pub fn play(&self) {
        let flush_interval = self.config.lock().flush_interval;
        let gate_open = {
            let mut engine = self.engine.lock();
            if engine.destroyed {
                return;
            }
            engine.state = PlaybackState::Played;
            engine.gate_latched || engine.cache_ready()
        };
        self.events.emit(PlayerEvent::Play);

        if gate_open {
            Self::start_flush(&self.engine, &self.tasks, flush_interval);
        } else {
            self.start_cache_poll(flush_interval);
        }
    }

    /// Suspend the sink clock. Blocks already scheduled freeze with it.
    ///
    /// Intake is *not* paused: `feed` keeps appending while paused, and the
    /// flush scheduler leaves the backlog untouched until resume.
    pub fn pause(&self) {
        {
            let mut engine = self.engine.lock();
            if engine.destroyed {
                return;
            }
            if let Some(sink) = engine.sink.as_mut() {
                sink.suspend();
            }
            engine.state = PlaybackState::Paused;
        }
        self.events.emit(PlayerEvent::Pause);
    }

    /// Resume the sink clock after [`pause`](Self::pause).
    pub fn resume(&self) {
        {
            let mut engine = self.engine.lock();
            if engine.destroyed {
                return;
            }
            if let Some(sink) = engine.sink.as_mut() {
                sink.resume();
            }
            engine.state = PlaybackState::Played;
        }
        self.events.emit(PlayerEvent::Resume);
    }

    /// Set the gain multiplier on the sink.
    pub fn set_volume(&self, volume: f32) {
        let mut engine = self.engine.lock();
        if let Some(sink) = engine.sink.as_mut() {
            sink.set_gain(volume);
        }
    }

    /// Current gain multiplier (0.0 once destroyed).
    pub fn volume(&self) -> f32 {
        self.engine.lock().sink.as_ref().map_or(0.0, |s| s.gain())
    }

    /// Duration of audio buffered but not yet flushed.
    pub fn buffered_duration(&self) -> Duration {
        self.engine.lock().accumulator.buffered_duration()
    }

    /// Whether buffered duration has reached the configured cache threshold.
    pub fn cache_ready(&self) -> bool {
        self.engine.lock().cache_ready()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlaybackState {
        self.engine.lock().state
    }

    /// Whether the player has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.engine.lock().destroyed
    }

    /// Discard all buffered and in-flight audio and reinitialize, so that
    /// subsequent feeds represent "now" rather than a stale backlog.
    ///
    /// The live volume is captured and carried into the new generation;
    /// event subscriptions are kept. A destroyed player stays destroyed.
    pub fn refresh(&self, options: RefreshOptions) -> Result<(), Error> {
        let volume = {
            let engine = self.engine.lock();
            if engine.destroyed {
                return Ok(());
            }
            engine
                .sink
                .as_ref()
                .map_or_else(|| self.config.lock().volume, |s| s.gain())
        };

        self.teardown(false);

        let config = {
            let mut config = self.config.lock();
            config.volume = volume;
            config.clone()
        };
        let sink = (self.factory.lock())(&config)?;
        *self.engine.lock() = EngineState::new(&config, sink);
        self.tasks.lock().torn_down = false;

        self.events.emit(PlayerEvent::Refresh);
        if options.play_after {
            self.play();
        }
        Ok(())
    }

    /// Tear the engine down: cancel timers, silence output, stop the current
    /// block and every block still in the in-flight history, release the sink.
    ///
    /// Safe to call at any point in the lifecycle, including before `play()`
    /// and repeatedly. With `release_listeners` set, event subscriptions are
    /// dropped as well.
    pub fn destroy(&self, release_listeners: bool) {
        self.teardown(release_listeners);
    }

    fn teardown(&self, release_listeners: bool) {
        // Take the task handles under the lock but join outside it: the poll
        // tick takes the tasks lock itself and would deadlock the join.
        let (flush, poll) = {
            let mut tasks = self.tasks.lock();
            tasks.torn_down = true;
            (tasks.flush.take(), tasks.poll.take())
        };
        if let Some(mut task) = flush {
            task.stop();
        }
        if let Some(mut task) = poll {
            task.stop();
        }

        {
            let mut engine = self.engine.lock();
            engine.destroyed = true;
            engine.accumulator.clear();
            let state = &mut *engine;
            if let Some(sink) = state.sink.as_mut() {
                // Mute first: anything the sink cannot stop synchronously is
                // at least silent.
                sink.set_gain(0.0);
                if let Some(id) = state.current.take() {
                    sink.stop(id);
                }
                for id in state.history.drain(..) {
                    sink.stop(id);
                }
                sink.stop_all();
            }
            state.sink = None;
        }

        if release_listeners {
            self.events.clear();
        }
    }

    fn start_cache_poll(&self, flush_interval: Duration) {
        let mut tasks = self.tasks.lock();
        if tasks.torn_down || tasks.poll.is_some() {
            // An existing poll task will start flushing once the gate opens;
            // no need for a second one.
            return;
        }
        let engine = Arc::clone(&self.engine);
        let task_slots = Arc::clone(&self.tasks);
        tasks.poll = Some(RepeatingTask::spawn(
            "cache-poll",
            CACHE_POLL_INTERVAL,
            move || {
                let (destroyed, ready) = {
                    let engine = engine.lock();
                    (
                        engine.destroyed,
                        engine.state == PlaybackState::Played && engine.cache_ready(),
                    )
                };
                if destroyed {
                    return false;
                }
                if ready {
                    Self::start_flush(&engine, &task_slots, flush_interval);
                    return false;
                }
                true
            },
        ));
    }

    /// Latch the gate and begin flushing: one synchronous flush, then the
    /// periodic task. Replaces any flush task already running.
    fn start_flush(
        engine: &Arc<Mutex<EngineState>>,
        tasks: &Arc<Mutex<TaskSlots>>,
        flush_interval: Duration,
    ) {
        let mut tasks = tasks.lock();
        if tasks.torn_down {
            return;
        }
        {
            let mut engine = engine.lock();
            if engine.destroyed {
                return;
            }
            engine.gate_latched = true;
        }
        if let Some(mut old) = tasks.flush.take() {
            old.stop();
        }

        Self::flush_tick(engine);

        let engine = Arc::clone(engine);
        tasks.flush = Some(RepeatingTask::spawn("flush", flush_interval, move || {
            Self::flush_tick(&engine)
        }));
    }

    /// One flush: drain the accumulator into an edge-faded block and chain it
    /// onto the sink clock. Returns false once the engine is destroyed so the
    /// periodic task cancels itself.
    fn flush_tick(engine: &Arc<Mutex<EngineState>>) -> bool {
        let mut engine = engine.lock();
        if engine.destroyed {
            return false;
        }

        // Reap completion notifications before anything else.
        let finished = engine
            .sink
            .as_mut()
            .map(|s| s.take_finished())
            .unwrap_or_default();
        if !finished.is_empty() {
            engine.history.retain(|id| !finished.contains(id));
            if let Some(current) = engine.current {
                if finished.contains(&current) {
                    engine.current = None;
                }
            }
        }

        if engine.state != PlaybackState::Played {
            // Paused: the backlog stays buffered until resume.
            return true;
        }
        if engine.accumulator.is_empty() {
            return true;
        }

        let samples = engine.accumulator.drain_all();
        let channels = engine.channels;
        let frames = samples.len() / channels;

        let mut per_channel = vec![Vec::with_capacity(frames); channels];
        for (i, sample) in samples.into_iter().enumerate() {
            per_channel[i % channels].push(sample);
        }
        for channel in &mut per_channel {
            apply_edge_fade(channel);
        }
        let block = PlaybackBlock::new(per_channel, engine.sample_rate);
        let block_duration = block.duration();

        let state = &mut *engine;
        let Some(sink) = state.sink.as_mut() else {
            return true;
        };

        // Never schedule in the past: an underrun snaps the cursor forward to
        // the sink clock, trading an audible gap for staying schedulable.
        let now = sink.now();
        if state.cursor < now {
            log::warn!(
                "underrun: cursor {:?} behind clock {:?}, snapping forward",
                state.cursor,
                now
            );
            state.cursor = now;
        }

        match sink.schedule(block, state.cursor) {
            Ok(id) => {
                state.cursor += block_duration;
                if let Some(previous) = state.current.take() {
                    state.history.push(previous);
                }
                state.current = Some(id);
            }
            Err(e) => log::warn!("failed to schedule block: {e}"),
        }
        true
    }
}

impl Drop for PcmPlayer {
    fn drop(&mut self) {
        self.teardown(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Codec;
    use crate::sink::{MockSink, MockSinkHandle};

    fn mock_factory() -> (SinkFactory, Arc<Mutex<Vec<MockSinkHandle>>>) {
        let handles: Arc<Mutex<Vec<MockSinkHandle>>> = Arc::new(Mutex::new(Vec::new()));
        let handles_clone = Arc::clone(&handles);
        let factory: SinkFactory = Box::new(move |cfg: &PlayerConfig| {
            let sink = MockSink::new(cfg.volume);
            handles_clone.lock().push(sink.handle());
            Ok(Box::new(sink) as Box<dyn AudioSink>)
        });
        (factory, handles)
    }

    fn stereo_config() -> PlayerConfig {
        PlayerConfig::builder()
            .codec(Codec::Int16)
            .channels(2)
            .sample_rate(8000)
            .cache_duration(Duration::from_millis(500))
            .flush_interval(Duration::from_secs(3600)) // ticks driven manually
            .build()
    }

    fn player() -> (PcmPlayer, MockSinkHandle) {
        let (factory, handles) = mock_factory();
        let player = PcmPlayer::new(stereo_config(), factory).unwrap();
        let handle = handles.lock()[0].clone();
        (player, handle)
    }

    /// Interleaved Int16 silence-ish payload of `samples` samples.
    fn int16_chunk(samples: usize, value: i16) -> Vec<u8> {
        let mut data = Vec::with_capacity(samples * 2);
        for _ in 0..samples {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }

    fn flush(player: &PcmPlayer) {
        PcmPlayer::flush_tick(&player.engine);
    }

    #[test]
    fn test_cache_gate_exact_threshold() {
        // channels=2, rate=8000, cache=500ms: the gate opens at exactly
        // 8000 interleaved samples and not one sample before.
        let (player, _handle) = player();
        player.feed(&int16_chunk(7998, 100)).unwrap();
        assert!(!player.cache_ready());
        player.feed(&int16_chunk(2, 100)).unwrap();
        assert!(player.cache_ready());
        assert_eq!(player.buffered_duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_flush_on_empty_accumulator_is_noop() {
        let (player, handle) = player();
        flush(&player);
        assert!(handle.scheduled().is_empty());
    }

    #[test]
    fn test_flush_drains_and_deinterleaves() {
        let (player, handle) = player();
        player.feed(&int16_chunk(8000, 1000)).unwrap();
        {
            player.engine.lock().state = PlaybackState::Played;
        }
        flush(&player);

        assert_eq!(player.buffered_duration(), Duration::ZERO);
        let scheduled = handle.scheduled();
        assert_eq!(scheduled.len(), 1);
        let block = &scheduled[0].block;
        assert_eq!(block.channel_count(), 2);
        assert_eq!(block.frames(), 4000);
        assert_eq!(block.duration(), Duration::from_millis(500));

        // Middle of the block is unfaded normalized data.
        let expected = 1000.0 / 32_768.0;
        assert!((block.channel(0)[2000] - expected).abs() < 1e-6);
        assert!((block.channel(1)[2000] - expected).abs() < 1e-6);
        // Edges are faded: first frame silent, last frame silent.
        assert_eq!(block.channel(0)[0], 0.0);
        assert_eq!(block.channel(0)[3999], 0.0);
    }

    #[test]
    fn test_chaining_is_gapless() {
        let (player, handle) = player();
        player.engine.lock().state = PlaybackState::Played;

        for _ in 0..3 {
            player.feed(&int16_chunk(4000, 500)).unwrap();
            flush(&player);
        }

        let scheduled = handle.scheduled();
        assert_eq!(scheduled.len(), 3);
        assert_eq!(scheduled[0].start, Duration::ZERO);
        for pair in scheduled.windows(2) {
            assert_eq!(
                pair[0].end(),
                pair[1].start,
                "blocks must chain with zero gap"
            );
        }
        // Total span equals the sum of block durations.
        let total: Duration = scheduled.iter().map(|s| s.block.duration()).sum();
        assert_eq!(scheduled[2].end(), total);
    }

    #[test]
    fn test_underrun_snaps_cursor_to_clock() {
        let (player, handle) = player();
        player.engine.lock().state = PlaybackState::Played;

        player.feed(&int16_chunk(4000, 500)).unwrap();
        flush(&player);
        assert_eq!(handle.scheduled()[0].start, Duration::ZERO);

        // Clock overtakes the cursor: host consumed all audio plus 300ms.
        handle.set_now(Duration::from_millis(550));
        player.feed(&int16_chunk(4000, 500)).unwrap();
        flush(&player);

        let scheduled = handle.scheduled();
        assert_eq!(
            scheduled[1].start,
            Duration::from_millis(550),
            "block must start at the clock, not in the past"
        );
        // The gap equals the overrun: 550ms - 250ms block end.
        assert_eq!(
            scheduled[1].start - scheduled[0].end(),
            Duration::from_millis(300)
        );

        // Steady state resumes chaining from the snapped cursor.
        player.feed(&int16_chunk(4000, 500)).unwrap();
        flush(&player);
        assert_eq!(handle.scheduled()[2].start, scheduled[1].end());
    }

    #[test]
    fn test_completion_reaping_trims_history() {
        let (player, handle) = player();
        player.engine.lock().state = PlaybackState::Played;

        for _ in 0..3 {
            player.feed(&int16_chunk(4000, 500)).unwrap();
            flush(&player);
        }
        assert_eq!(player.engine.lock().history.len(), 2);

        // First two blocks (500ms of audio) finish.
        handle.set_now(Duration::from_millis(500));
        flush(&player);
        assert!(player.engine.lock().history.is_empty());
        assert!(player.engine.lock().current.is_some());
    }

    #[test]
    fn test_pause_freezes_drain_and_resume_flushes_backlog() {
        let (player, handle) = player();
        player.play();
        assert_eq!(player.state(), PlaybackState::Played);

        player.pause();
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(handle.suspended());

        // Intake continues while paused, but flushing leaves it buffered.
        player.feed(&int16_chunk(8000, 500)).unwrap();
        flush(&player);
        assert!(handle.scheduled().is_empty());
        assert_eq!(player.buffered_duration(), Duration::from_millis(500));

        player.resume();
        assert!(!handle.suspended());
        flush(&player);
        assert_eq!(handle.scheduled().len(), 1);
    }

    #[test]
    fn test_play_starts_flush_when_gate_already_open() {
        let (player, handle) = player();
        player.feed(&int16_chunk(8000, 500)).unwrap();
        player.play();
        // First flush is synchronous, so the block is already scheduled.
        assert_eq!(handle.scheduled().len(), 1);
        assert_eq!(player.state(), PlaybackState::Played);
    }

    #[test]
    fn test_refresh_discards_backlog_and_preserves_volume() {
        let (factory, handles) = mock_factory();
        let player = PcmPlayer::new(stereo_config(), factory).unwrap();

        player.feed(&int16_chunk(8000, 500)).unwrap();
        player.play();
        player.set_volume(0.3);

        player
            .refresh(RefreshOptions { play_after: false })
            .unwrap();

        assert_eq!(handles.lock().len(), 2, "refresh must build a fresh sink");
        let new_handle = handles.lock()[1].clone();
        assert_eq!(player.buffered_duration(), Duration::ZERO);
        assert!(player.engine.lock().history.is_empty());
        assert!(player.engine.lock().current.is_none());
        assert_eq!(player.volume(), 0.3, "live volume carries across refresh");
        assert_eq!(player.state(), PlaybackState::NotPlayed);
        assert!(!player.is_destroyed());

        // The new generation plays normally.
        player.feed(&int16_chunk(8000, 500)).unwrap();
        player.play();
        assert_eq!(new_handle.scheduled().len(), 1);
    }

    #[test]
    fn test_refresh_emits_event_and_can_replay() {
        let (player, _handle) = player();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        player.events().subscribe(move |e| events_clone.lock().push(e));

        player.refresh(RefreshOptions { play_after: true }).unwrap();
        assert_eq!(
            *events.lock(),
            vec![PlayerEvent::Refresh, PlayerEvent::Play]
        );
        assert_eq!(player.state(), PlaybackState::Played);
    }

    #[test]
    fn test_destroy_stops_every_in_flight_block() {
        let (player, handle) = player();
        player.engine.lock().state = PlaybackState::Played;

        for _ in 0..3 {
            player.feed(&int16_chunk(4000, 500)).unwrap();
            flush(&player);
        }

        player.destroy(false);

        assert_eq!(handle.gain(), 0.0, "output must be muted");
        assert_eq!(handle.stopped().len(), 3, "current + history all stopped");
        assert!(handle.stop_all_calls() >= 1);
        assert!(player.is_destroyed());
    }

    #[test]
    fn test_destroy_is_idempotent_and_safe_before_play() {
        let (player, _handle) = player();
        player.destroy(false);
        player.destroy(false);
        player.destroy(true);
    }

    #[test]
    fn test_feed_after_destroy_is_rejected() {
        let (player, _handle) = player();
        player.destroy(false);
        let err = player.feed(&int16_chunk(2, 0)).unwrap_err();
        assert!(matches!(err, Error::Destroyed));
    }

    #[test]
    fn test_destroy_releases_listeners_only_when_asked() {
        let (player, _handle) = player();
        player.events().subscribe(|_| {});
        player.destroy(false);
        assert_eq!(player.events().len(), 1);
        player.destroy(true);
        assert!(player.events().is_empty());
    }

    #[test]
    fn test_destroyed_player_stays_destroyed_on_refresh() {
        let (factory, handles) = mock_factory();
        let player = PcmPlayer::new(stereo_config(), factory).unwrap();
        player.destroy(false);
        player.refresh(RefreshOptions::default()).unwrap();
        assert!(player.is_destroyed());
        assert_eq!(handles.lock().len(), 1, "no new sink after destroy");
    }

    #[test]
    fn test_malformed_feed_leaves_buffer_intact() {
        let (player, _handle) = player();
        player.feed(&int16_chunk(100, 7)).unwrap();
        let before = player.buffered_duration();
        // 3 bytes is not a whole number of Int16 samples.
        let err = player.feed(&[1u8, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInput(_)));
        assert_eq!(player.buffered_duration(), before);
    }

    #[test]
    fn test_event_sequence_play_pause_resume() {
        let (player, _handle) = player();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        player.events().subscribe(move |e| events_clone.lock().push(e));

        player.play();
        player.pause();
        player.resume();

        assert_eq!(
            *events.lock(),
            vec![
                PlayerEvent::Play,
                PlayerEvent::Pause,
                PlayerEvent::Resume
            ]
        );
    }

    #[test]
    fn test_listener_may_drive_the_player() {
        let (factory, handles) = mock_factory();
        let player = Arc::new(PcmPlayer::new(stereo_config(), factory).unwrap());
        let handle = handles.lock()[0].clone();

        // A listener that pauses as soon as playback starts must not wedge
        // the emitting call.
        let player_clone = Arc::clone(&player);
        player.events().subscribe(move |e| {
            if e == PlayerEvent::Play {
                player_clone.pause();
            }
        });

        player.play();
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(handle.suspended());

        // Break the listener's reference cycle and stop the poll task.
        player.destroy(true);
    }

    #[test]
    fn test_set_volume_forwards_to_sink() {
        let (player, handle) = player();
        player.set_volume(0.42);
        assert_eq!(handle.gain(), 0.42);
        assert_eq!(player.volume(), 0.42);
    }
}
