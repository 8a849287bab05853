// ABOUTME: Lifecycle event pub/sub for the player
// ABOUTME: Composed capability: the engine holds a bus instead of extending an emitter

use parking_lot::Mutex;
use std::sync::Arc;

/// Lifecycle notifications emitted by the player. Events carry no payload
/// beyond their name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback was requested via `play()`.
    Play,
    /// Playback was suspended via `pause()`.
    Pause,
    /// Playback was resumed via `resume()`.
    Resume,
    /// The engine discarded its backlog and reinitialized via `refresh()`.
    Refresh,
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Listener = Arc<dyn Fn(PlayerEvent) + Send + Sync>;

struct BusInner {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Publish/subscribe bus for [`PlayerEvent`]s.
///
/// Cloning shares the subscriber list; subscriptions survive `refresh` and
/// are dropped by `destroy(true)`. Listeners run synchronously on the thread
/// that emits, which may be a timer thread, so keep them short.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener for every emitted event.
    pub fn subscribe(&self, listener: impl Fn(PlayerEvent) + Send + Sync + 'static) -> Subscription {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        Subscription(id)
    }

    /// Remove one listener. Unknown subscriptions are ignored.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.inner.lock().listeners.retain(|(id, _)| *id != subscription.0);
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.inner.lock().listeners.clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().listeners.is_empty()
    }

    /// Deliver an event to every listener in subscription order.
    ///
    /// Listeners run outside the bus lock, so a listener may re-enter the
    /// bus (subscribe, unsubscribe) or drive the player, which emits again.
    pub(crate) fn emit(&self, event: PlayerEvent) {
        let listeners: Vec<Listener> = {
            let inner = self.inner.lock();
            inner
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        for listener in listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
