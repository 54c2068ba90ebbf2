//! The capability seam between the pipeline and the host HID subsystem.

use std::error::Error;

use thiserror::Error;

use crate::{
    element::{Element, ElementCookie},
    queue::EventQueue,
};

/// The error type OS-mediated calls surface across the capability seam.
///
/// Concrete adapters box their own error types into this, the same way a raw
/// HID backend is wired in behind a trait elsewhere in the stack.
pub type OsError = Box<dyn Error + Send + Sync>;

/// A device-interface capability over one HID peripheral.
///
/// One concrete adapter binds this to the host subsystem; the resolver, the
/// queue, the dispatcher and the tests all depend only on this trait.
/// Dropping the capability releases the underlying interface.
pub trait DeviceCapability {
    /// Opens the device with exclusive (seizing) access.
    ///
    /// Must precede [`Self::elements`] and [`Self::watch`].
    fn open(&mut self) -> Result<(), OsError>;

    /// Closes a previously opened device.
    ///
    /// Callers invoke this only if [`Self::open`] succeeded.
    fn close(&mut self) -> Result<(), OsError>;

    /// Snapshots every control element the device exposes, in enumeration
    /// order.
    ///
    /// A failure here is device-wide; individually incomplete elements are
    /// returned as-is and left to the resolver to skip.
    fn elements(&mut self) -> Result<Vec<Element>, OsError>;

    /// Allocates a bounded event queue of `depth` pending events, registers
    /// the six watched cookies and starts delivery.
    ///
    /// Absent (zero) cookies are registered like any other; they never fire.
    /// Delivery must not begin before the returned queue exists, so no early
    /// event is missed.
    fn watch(
        &mut self,
        cookies: [ElementCookie; 6],
        depth: usize,
    ) -> Result<EventQueue, OsError>;
}

/// Locates peripherals in the host registry and produces capability objects
/// for them.
pub trait HidHost {
    type Capability: DeviceCapability;

    /// Searches the registry for a device whose declared name equals `name`
    /// and converts it into a capability object.
    ///
    /// The first enumerated match wins; multiple matches are not
    /// disambiguated. Returns `Ok(None)` if no device matches.
    fn locate(&self, name: &str) -> Result<Option<Self::Capability>, OsError>;
}

/// An error raised while acquiring the peripheral or its event queue.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The registry holds no device with the expected name.
    #[error("peripheral \"{0}\" not found")]
    NotFound(String),

    /// An OS-mediated acquisition call failed.
    #[error("failed to {context}")]
    Os {
        /// What the failing call was trying to do.
        context: &'static str,

        /// The status the host subsystem reported.
        #[source]
        source: OsError,
    },
}

impl AcquireError {
    /// `EX_OSERR`, the dedicated exit status for failed OS-service calls.
    pub const EX_OSERR: u8 = 71;

    /// Wraps an [`OsError`] with the context of the failing call.
    pub fn os(context: &'static str) -> impl FnOnce(OsError) -> Self {
        move |source| Self::Os { context, source }
    }

    /// The process exit status this error maps to: 1 for generic setup
    /// failures, [`Self::EX_OSERR`] for failed OS-mediated calls.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::NotFound(_) => 1,
            Self::Os { .. } => Self::EX_OSERR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_statuses_distinguish_os_errors() {
        let not_found = AcquireError::NotFound("AppleIRController".into());
        assert_eq!(not_found.exit_status(), 1);

        let os = AcquireError::os("open the device")("permission denied".into());
        assert_eq!(os.exit_status(), AcquireError::EX_OSERR);
    }

    #[test]
    fn os_errors_keep_their_source() {
        let err = AcquireError::os("enumerate device elements")("bus error".into());
        assert_eq!(err.to_string(), "failed to enumerate device elements");
        assert_eq!(err.source().unwrap().to_string(), "bus error");
    }
}
