//! Live output broadcasting
//!
//! Every chunk a running command writes to stdout or stderr is re-published
//! here to all listeners registered on that channel. Chunks of concurrent
//! invocations share the same two channels; a listener cannot tell which
//! invocation produced a chunk.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Output channel of the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Stdout,
    Stderr,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Stdout, Channel::Stderr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by [`OutputBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Publish/subscribe hub for command output
///
/// Listeners are called synchronously, in registration order, on the task
/// that reads the process output. A listener that panics is logged and
/// skipped; the remaining listeners still receive the chunk.
pub struct OutputBus {
    next_id: AtomicU64,
    stdout: RwLock<Vec<(SubscriptionId, Listener)>>,
    stderr: RwLock<Vec<(SubscriptionId, Listener)>>,
}

impl Default for OutputBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OutputBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBus")
            .field("stdout_listeners", &self.listener_count(Channel::Stdout))
            .field("stderr_listeners", &self.listener_count(Channel::Stderr))
            .finish()
    }
}

impl OutputBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            stdout: RwLock::new(Vec::new()),
            stderr: RwLock::new(Vec::new()),
        }
    }

    fn listeners(&self, channel: Channel) -> &RwLock<Vec<(SubscriptionId, Listener)>> {
        match channel {
            Channel::Stdout => &self.stdout,
            Channel::Stderr => &self.stderr,
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register `listener` for every chunk published on `channel`
    pub fn subscribe<F>(&self, channel: Channel, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.listeners(channel).write().push((id, Arc::new(listener)));
        id
    }

    /// Register one listener on both channels under a single id
    pub fn subscribe_all<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.next_id();
        let listener: Listener = Arc::new(listener);
        for channel in Channel::ALL {
            self.listeners(channel).write().push((id, Arc::clone(&listener)));
        }
        id
    }

    /// Remove a listener from `channel`
    ///
    /// Returns `false` if it was not registered there.
    pub fn unsubscribe(&self, channel: Channel, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners(channel).write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Remove a listener from both channels
    pub fn unsubscribe_all(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for channel in Channel::ALL {
            removed |= self.unsubscribe(channel, id);
        }
        removed
    }

    /// Number of listeners currently registered on `channel`
    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners(channel).read().len()
    }

    /// Deliver `chunk` to every listener currently registered on `channel`
    pub fn publish(&self, channel: Channel, chunk: &str) {
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners(channel)
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(%channel, bytes = chunk.len(), listeners = listeners.len(), "publishing chunk");

        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(chunk))).is_err() {
                warn!(%channel, "output listener panicked; continuing with remaining listeners");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn collector() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |chunk: &str| sink.lock().push(chunk.to_string()))
    }

    #[test]
    fn test_publish_reaches_only_its_channel() {
        let bus = OutputBus::new();
        let (stdout_seen, stdout_listener) = collector();
        let (stderr_seen, stderr_listener) = collector();
        bus.subscribe(Channel::Stdout, stdout_listener);
        bus.subscribe(Channel::Stderr, stderr_listener);

        bus.publish(Channel::Stdout, "building\n");
        bus.publish(Channel::Stderr, "warning\n");
        bus.publish(Channel::Stdout, "done\n");

        assert_eq!(*stdout_seen.lock(), vec!["building\n", "done\n"]);
        assert_eq!(*stderr_seen.lock(), vec!["warning\n"]);
    }

    #[test]
    fn test_listeners_called_in_insertion_order() {
        let bus = OutputBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            bus.subscribe(Channel::Stdout, move |_| order.lock().push(n));
        }
        bus.publish(Channel::Stdout, "x");
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = OutputBus::new();
        let (seen, listener) = collector();
        let id = bus.subscribe(Channel::Stdout, listener);

        bus.publish(Channel::Stdout, "first");
        assert!(bus.unsubscribe(Channel::Stdout, id));
        bus.publish(Channel::Stdout, "second");

        assert_eq!(*seen.lock(), vec!["first"]);
        assert_eq!(bus.listener_count(Channel::Stdout), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let bus = OutputBus::new();
        let id = bus.subscribe(Channel::Stderr, |_| {});
        assert!(!bus.unsubscribe(Channel::Stdout, id));
        assert!(bus.unsubscribe(Channel::Stderr, id));
        assert!(!bus.unsubscribe(Channel::Stderr, id));
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = OutputBus::new();
        bus.subscribe(Channel::Stdout, |_| panic!("listener failure"));
        let (seen, listener) = collector();
        bus.subscribe(Channel::Stdout, listener);

        bus.publish(Channel::Stdout, "still delivered");
        assert_eq!(*seen.lock(), vec!["still delivered"]);
    }

    #[test]
    fn test_subscribe_all_shares_one_id() {
        let bus = OutputBus::new();
        let (seen, listener) = collector();
        let id = bus.subscribe_all(listener);

        bus.publish(Channel::Stdout, "out");
        bus.publish(Channel::Stderr, "err");
        assert_eq!(*seen.lock(), vec!["out", "err"]);

        assert!(bus.unsubscribe_all(id));
        assert_eq!(bus.listener_count(Channel::Stdout), 0);
        assert_eq!(bus.listener_count(Channel::Stderr), 0);
        assert!(!bus.unsubscribe_all(id));
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let bus = Arc::new(OutputBus::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicU64::new(0));

        let id = {
            let inner = Arc::clone(&bus);
            let slot = Arc::clone(&slot);
            let calls = Arc::clone(&calls);
            bus.subscribe(Channel::Stdout, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = slot.lock().take() {
                    inner.unsubscribe(Channel::Stdout, id);
                }
            })
        };
        *slot.lock() = Some(id);

        bus.publish(Channel::Stdout, "once");
        bus.publish(Channel::Stdout, "twice");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::Stdout.to_string(), "stdout");
        assert_eq!(serde_json::to_string(&Channel::Stderr).unwrap(), "\"stderr\"");
    }
}
