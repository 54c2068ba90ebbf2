//! The ordered acquisition and teardown sequence.

use std::io::Write;

use log::{debug, info};

use crate::{
    button::ButtonMap,
    capability::{AcquireError, DeviceCapability, HidHost},
    dispatch::{self, ActionSink, Mode, Router},
    queue::QUEUE_DEPTH,
};

/// Acquires the peripheral named `name` and runs the event loop.
///
/// The sequence is one-shot and ordered: locate, open, snapshot elements,
/// resolve cookies, allocate and watch the queue, dispatch, close. Every
/// failing step aborts the sequence; `close` runs only if `open` succeeded,
/// and the capability is dropped exactly once on every path. Returns when
/// the event source disconnects, which in normal operation means the process
/// is being torn down.
pub fn run<H, W, S>(
    host: &H,
    name: &str,
    mode: Mode,
    out: W,
    sink: S,
) -> Result<(), AcquireError>
where
    H: HidHost,
    W: Write,
    S: ActionSink,
{
    let located = host
        .locate(name)
        .map_err(AcquireError::os("search the device registry"))?;
    let Some(mut capability) = located else {
        return Err(AcquireError::NotFound(name.to_owned()));
    };
    info!("located peripheral \"{name}\"");

    capability.open().map_err(AcquireError::os("open the device"))?;

    let run = run_opened(&mut capability, mode, out, sink);

    // The device is open at this point, so close it no matter how the run
    // went, but let a run error take precedence over a close error.
    let close = capability.close().map_err(AcquireError::os("close the device"));

    run.and(close)
}

fn run_opened<C, W, S>(
    capability: &mut C,
    mode: Mode,
    out: W,
    sink: S,
) -> Result<(), AcquireError>
where
    C: DeviceCapability,
    W: Write,
    S: ActionSink,
{
    let elements = capability
        .elements()
        .map_err(AcquireError::os("enumerate device elements"))?;

    let map = ButtonMap::resolve(&elements);
    let roles = map.logical_role();
    debug!("resolved {} elements into {map:?}", elements.len());

    // Queue allocation failure is fatal, like every other acquisition step.
    let queue = capability
        .watch(map.watched(), QUEUE_DEPTH)
        .map_err(AcquireError::os("allocate the event queue"))?;

    let mut router = Router::new(mode, roles, out, sink);
    dispatch::run(queue, &mut router);

    Ok(())
}
