//! Control elements as the device reports them.

use std::fmt;

/// The usage page grouping the system menu controls the remote exposes.
pub const GENERIC_DESKTOP_PAGE: u16 = 0x01;

/// An opaque, device-assigned token identifying one control element.
///
/// Cookies are meaningless across device instances or firmware revisions.
/// The zero cookie doubles as the sentinel for a control the device does not
/// expose.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ElementCookie(pub u32);

impl ElementCookie {
    /// The sentinel for an unexposed control.
    pub const ABSENT: Self = Self(0);

    pub fn is_absent(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ElementCookie {
    /// Formats the cookie as the fixed-width hexadecimal token used in
    /// report-mode output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// One entry of the device-wide element snapshot.
///
/// Each attribute is reported by the hardware and may be missing for an
/// individual element; the resolver skips such elements instead of failing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Element {
    /// The cookie identifying the element.
    pub cookie: Option<ElementCookie>,

    /// The usage code describing what the element represents.
    pub usage: Option<u16>,

    /// The usage page the usage code belongs to.
    pub usage_page: Option<u16>,
}

impl Element {
    /// Convenience constructor for a fully-reported element.
    pub fn new(cookie: ElementCookie, usage_page: u16, usage: u16) -> Self {
        Self {
            cookie: Some(cookie),
            usage: Some(usage),
            usage_page: Some(usage_page),
        }
    }
}
