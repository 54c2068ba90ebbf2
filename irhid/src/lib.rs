//! Device acquisition and event dispatch for the Apple Infrared Remote.
//!
//! The remote shows up in the host's HID registry as a peripheral whose
//! control elements are identified by opaque, device-assigned tokens called
//! *cookies*. This crate implements the whole pipeline from locating that one
//! peripheral to routing its button events:
//!
//! 1. [`capability::HidHost::locate`] finds the matching device and hands out
//!    a [`capability::DeviceCapability`] for it.
//! 2. [`button::ButtonMap::resolve`] turns the device's element snapshot into
//!    the six logical buttons and derives the drive-mode
//!    [`button::LogicalRole`] in the same pass.
//! 3. [`capability::DeviceCapability::watch`] allocates a bounded event queue
//!    for exactly those cookies and starts delivery.
//! 4. [`dispatch::run`] blocks until an event is pending, drains the queue to
//!    empty and forwards each event in arrival order to the
//!    [`dispatch::Router`], which either reports it or drives the external
//!    viewer through an [`dispatch::ActionSink`].
//!
//! The host HID subsystem itself is deliberately not implemented here. The
//! crate talks to it only through the traits in [`capability`], so the
//! pipeline can be exercised end to end with a fake adapter; one concrete
//! adapter lives in the `ird` binary. [`session::run`] ties the steps
//! together and enforces the acquisition lifecycle: every transition is a
//! one-shot, ordered call, close happens only after a successful open, and
//! the capability is released exactly once.

pub mod button;
pub mod capability;
pub mod dispatch;
pub mod element;
pub mod queue;
pub mod session;
