// ABOUTME: Deterministic audio sink with a manually driven clock
// ABOUTME: Records scheduling decisions so tests can assert them exactly

use crate::audio::{BlockId, PlaybackBlock};
use crate::error::Error;
use crate::sink::AudioSink;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// One schedule call recorded by a [`MockSink`].
#[derive(Debug, Clone)]
pub struct ScheduledBlock {
    /// Id handed back to the engine.
    pub id: BlockId,
    /// Absolute start time requested.
    pub start: Duration,
    /// The block itself.
    pub block: PlaybackBlock,
}

impl ScheduledBlock {
    /// Scheduled end time of the block.
    pub fn end(&self) -> Duration {
        self.start + self.block.duration()
    }
}

#[derive(Debug, Default)]
struct MockState {
    now: Duration,
    next_id: u64,
    scheduled: Vec<ScheduledBlock>,
    active: Vec<(BlockId, Duration)>,
    finished: Vec<BlockId>,
    stopped: Vec<BlockId>,
    stop_all_calls: usize,
    gain: f32,
    suspended: bool,
}

/// An [`AudioSink`] that never touches a device.
///
/// The clock only moves when a [`MockSinkHandle`] advances it, which makes
/// every scheduling decision of the engine reproducible: cursor chaining,
/// underrun snapping, and completion reaping can all be asserted exactly.
pub struct MockSink {
    state: Arc<Mutex<MockState>>,
}

impl MockSink {
    /// Create a sink at the given initial gain.
    pub fn new(gain: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                gain,
                ..MockState::default()
            })),
        }
    }

    /// Inspection/control handle that stays valid after the sink is handed
    /// to the engine.
    pub fn handle(&self) -> MockSinkHandle {
        MockSinkHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl AudioSink for MockSink {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule(&mut self, block: PlaybackBlock, at: Duration) -> Result<BlockId, Error> {
        let mut state = self.state.lock();
        let id = BlockId(state.next_id);
        state.next_id += 1;
        let end = at + block.duration();
        state.scheduled.push(ScheduledBlock {
            id,
            start: at,
            block,
        });
        state.active.push((id, end));
        Ok(id)
    }

    fn take_finished(&mut self) -> Vec<BlockId> {
        std::mem::take(&mut self.state.lock().finished)
    }

    fn stop(&mut self, id: BlockId) {
        let mut state = self.state.lock();
        state.stopped.push(id);
        if let Some(pos) = state.active.iter().position(|(a, _)| *a == id) {
            state.active.remove(pos);
            state.finished.push(id);
        }
    }

    fn stop_all(&mut self) {
        let mut state = self.state.lock();
        state.stop_all_calls += 1;
        let remaining: Vec<BlockId> = state.active.drain(..).map(|(id, _)| id).collect();
        state.finished.extend(remaining);
    }

    fn set_gain(&mut self, gain: f32) {
        self.state.lock().gain = gain;
    }

    fn gain(&self) -> f32 {
        self.state.lock().gain
    }

    fn suspend(&mut self) {
        self.state.lock().suspended = true;
    }

    fn resume(&mut self) {
        self.state.lock().suspended = false;
    }
}

/// Shared view into a [`MockSink`], for tests.
#[derive(Clone)]
pub struct MockSinkHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockSinkHandle {
    /// Move the clock. Blocks whose end time has passed become completion
    /// notifications on the next `take_finished`.
    pub fn set_now(&self, now: Duration) {
        let mut state = self.state.lock();
        state.now = now;
        let mut i = 0;
        while i < state.active.len() {
            if state.active[i].1 <= now {
                let (id, _) = state.active.remove(i);
                state.finished.push(id);
            } else {
                i += 1;
            }
        }
    }

    /// Current clock value.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Every schedule call so far, in order.
    pub fn scheduled(&self) -> Vec<ScheduledBlock> {
        self.state.lock().scheduled.clone()
    }

    /// Ids that received an explicit `stop`.
    pub fn stopped(&self) -> Vec<BlockId> {
        self.state.lock().stopped.clone()
    }

    /// Number of `stop_all` calls.
    pub fn stop_all_calls(&self) -> usize {
        self.state.lock().stop_all_calls
    }

    /// Current gain.
    pub fn gain(&self) -> f32 {
        self.state.lock().gain
    }

    /// Whether the clock is suspended.
    pub fn suspended(&self) -> bool {
        self.state.lock().suspended
    }

    /// Mark one block as finished without moving the clock.
    pub fn finish(&self, id: BlockId) {
        let mut state = self.state.lock();
        if let Some(pos) = state.active.iter().position(|(a, _)| *a == id) {
            state.active.remove(pos);
            state.finished.push(id);
        }
    }
}
