//! The bounded event queue bridging the notification source to the dispatch
//! loop.
//!
//! The adapter side feeds events into the producer half from wherever the
//! host subsystem delivers them; the consumer half belongs to the dispatch
//! loop, which blocks on [`EventQueue::wait`] and drains with
//! [`EventQueue::poll`]. The channel is FIFO and bounded, so events reach
//! the router in hardware order and never pile up past the configured depth.

use std::fmt;

use crate::element::ElementCookie;

/// How many pending events the queue holds at most.
pub const QUEUE_DEPTH: usize = 8;

/// The edge of a button event, derived from its value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Edge {
    Pressed,
    Depressed,
}

impl Edge {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pressed => "pressed",
            Self::Depressed => "depressed",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One button event drained from the queue.
///
/// Transient: produced by the adapter, consumed immediately by the
/// dispatcher.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Event {
    /// The cookie of the element that fired.
    pub cookie: ElementCookie,

    /// The element's reported value; nonzero means pressed.
    pub value: i32,
}

impl Event {
    pub fn edge(self) -> Edge {
        if self.value != 0 { Edge::Pressed } else { Edge::Depressed }
    }
}

/// The producer half of the queue, handed to the concrete adapter.
pub struct EventSender(flume::Sender<Event>);

impl EventSender {
    /// Offers an event to the queue without ever blocking the notification
    /// source.
    ///
    /// Events arriving while the queue is at depth are dropped (overflow is
    /// undefined input). Returns `false` once the consumer half is gone, at
    /// which point the adapter should stop delivering.
    pub fn offer(&self, event: Event) -> bool {
        match self.0.try_send(event) {
            Ok(()) => true,
            Err(flume::TrySendError::Full(_)) => true,
            Err(flume::TrySendError::Disconnected(_)) => false,
        }
    }

    /// Whether the consumer half still exists.
    pub fn is_live(&self) -> bool {
        !self.0.is_disconnected()
    }
}

/// The consumer half of the queue, owned by the dispatch loop.
pub struct EventQueue {
    rx: flume::Receiver<Event>,
}

impl EventQueue {
    /// Creates a queue holding at most `depth` pending events.
    pub fn bounded(depth: usize) -> (EventSender, EventQueue) {
        let (tx, rx) = flume::bounded(depth);
        (EventSender(tx), EventQueue { rx })
    }

    /// Blocks until at least one event is pending and returns it.
    ///
    /// This is the single suspension point of the pipeline; suspension is
    /// indefinite. Returns [`None`] once every producer is gone.
    pub fn wait(&self) -> Option<Event> {
        self.rx.recv().ok()
    }

    /// Non-blocking poll used to drain the queue after a wake.
    pub fn poll(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}
