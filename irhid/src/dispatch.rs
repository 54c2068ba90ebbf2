//! Routes drained events according to the configured mode.

use std::io::Write;

use log::{debug, warn};

use crate::{
    button::{Direction, LogicalRole},
    queue::{Event, EventQueue},
};

/// The operating mode, fixed for the process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Mode {
    /// Print one line per event.
    #[default]
    Report,

    /// Translate next/previous presses into viewer commands.
    Drive,
}

/// The external collaborator qualifying presses are forwarded to in drive
/// mode.
pub trait ActionSink {
    /// Forwards one qualifying press. Called at most once per press edge.
    fn forward(&mut self, direction: Direction);
}

/// Interprets drained events: prints them in report mode, forwards
/// next/previous press edges to the action sink in drive mode.
pub struct Router<W, S> {
    mode: Mode,
    roles: LogicalRole,
    out: W,
    sink: S,
}

impl<W: Write, S: ActionSink> Router<W, S> {
    pub fn new(mode: Mode, roles: LogicalRole, out: W, sink: S) -> Self {
        Self {
            mode,
            roles,
            out,
            sink,
        }
    }

    /// Handles one drained event.
    pub fn route(&mut self, event: Event) {
        match self.mode {
            Mode::Report => {
                if let Err(err) = writeln!(self.out, "{} {}", event.cookie, event.edge()) {
                    warn!("could not write event report: {err}");
                }
            }
            Mode::Drive => {
                // Release edges never drive the viewer.
                if event.value == 0 {
                    return;
                }

                if let Some(direction) = self.roles.direction(event.cookie) {
                    debug!("forwarding {} for {}", direction.as_str(), event.cookie);
                    self.sink.forward(direction);
                }
            }
        }
    }
}

/// Runs the dispatch loop.
///
/// Blocks until the queue has at least one pending event, drains it to empty
/// with non-blocking polls, forwards every event in arrival order, then
/// re-suspends. Returns once the producer side of the queue is gone; in
/// normal operation that never happens and the loop runs until the process
/// is terminated externally.
pub fn run<W: Write, S: ActionSink>(queue: EventQueue, router: &mut Router<W, S>) {
    while let Some(event) = queue.wait() {
        router.route(event);

        while let Some(event) = queue.poll() {
            router.route(event);
        }
    }
}
