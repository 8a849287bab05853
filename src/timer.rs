// ABOUTME: Cancellable repeating task on a dedicated thread
// ABOUTME: Tick cadence via channel recv_timeout; stop is idempotent and joins

use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// A periodic task running on its own thread.
///
/// The tick callback returns `true` to keep running or `false` to cancel
/// itself (used by the cache-gate poll, which stops after its first success).
/// `stop` signals the thread and joins it; calling it again, or after the
/// task cancelled itself, is a no-op.
pub(crate) struct RepeatingTask {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    /// Spawn a task ticking every `period`.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn the thread. Spawn failure means the
    /// process is out of resources; there is no degraded mode in which the
    /// engine can keep its scheduling promises without the timer.
    pub(crate) fn spawn(
        name: &str,
        period: Duration,
        mut tick: impl FnMut() -> bool + Send + 'static,
    ) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name(format!("pcm-stream-{name}"))
            .spawn(move || loop {
                match stop_rx.recv_timeout(period) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        if !tick() {
                            break;
                        }
                    }
                }
            })
            .expect("failed to spawn timer thread");
        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the task to stop and wait for the thread to exit.
    pub(crate) fn stop(&mut self) {
        // try_send: the buffered slot makes repeated stops no-ops, and a task
        // that already exited has dropped the receiver.
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop();
    }
}
