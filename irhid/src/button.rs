//! Maps hardware cookies to the six logical remote buttons.

use num_enum::TryFromPrimitive;

use crate::element::{Element, ElementCookie, GENERIC_DESKTOP_PAGE};

/// The six buttons of the remote, identified by their Generic Desktop usage
/// codes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, TryFromPrimitive)]
#[repr(u16)]
pub enum Button {
    /// System App Menu, the "Menu" button.
    AppMenu = 0x85,

    /// System Menu, the center "Select" button.
    Select = 0x86,

    /// System Menu Right, the "Next" button.
    Right = 0x87,

    /// System Menu Left, the "Previous" button.
    Left = 0x88,

    /// System Menu Up, the "Volume Up" button.
    Up = 0x89,

    /// System Menu Down, the "Volume Down" button.
    Down = 0x8a,
}

impl Button {
    /// Every button in slot order.
    pub const ALL: [Button; 6] = [
        Button::AppMenu,
        Button::Select,
        Button::Right,
        Button::Left,
        Button::Up,
        Button::Down,
    ];
}

/// The direction a qualifying press is translated into in drive mode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
        }
    }
}

/// The resolved cookie of every remote button.
///
/// Built once from the device's element snapshot and immutable afterwards.
/// A slot holds [`ElementCookie::ABSENT`] if the device does not expose the
/// control.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ButtonMap {
    app_menu: ElementCookie,
    select: ElementCookie,
    right: ElementCookie,
    left: ElementCookie,
    up: ElementCookie,
    down: ElementCookie,
}

impl ButtonMap {
    /// Builds the map from a device element snapshot.
    ///
    /// Only elements on the Generic Desktop usage page are considered, and
    /// within that page only the six known usage codes; everything else is
    /// ignored without error. An element missing any attribute is skipped.
    /// Each usage code maps to exactly one slot, and resolving the same
    /// snapshot twice yields the same map.
    pub fn resolve(elements: &[Element]) -> Self {
        let mut map = Self::default();

        for element in elements {
            let (Some(cookie), Some(usage), Some(usage_page)) =
                (element.cookie, element.usage, element.usage_page)
            else {
                continue;
            };

            if usage_page != GENERIC_DESKTOP_PAGE {
                continue;
            }

            let Ok(button) = Button::try_from(usage) else {
                continue;
            };

            *map.slot_mut(button) = cookie;
        }

        map
    }

    fn slot_mut(&mut self, button: Button) -> &mut ElementCookie {
        match button {
            Button::AppMenu => &mut self.app_menu,
            Button::Select => &mut self.select,
            Button::Right => &mut self.right,
            Button::Left => &mut self.left,
            Button::Up => &mut self.up,
            Button::Down => &mut self.down,
        }
    }

    /// The cookie resolved for a button, or [`ElementCookie::ABSENT`].
    pub fn cookie(&self, button: Button) -> ElementCookie {
        match button {
            Button::AppMenu => self.app_menu,
            Button::Select => self.select,
            Button::Right => self.right,
            Button::Left => self.left,
            Button::Up => self.up,
            Button::Down => self.down,
        }
    }

    /// All six slots in fixed order, for queue registration.
    ///
    /// Absent slots are included; registering the zero cookie is accepted and
    /// simply never fires.
    pub fn watched(&self) -> [ElementCookie; 6] {
        Button::ALL.map(|button| self.cookie(button))
    }

    /// Derives the drive-mode roles: Right maps to "next", Left to
    /// "previous".
    pub fn logical_role(&self) -> LogicalRole {
        LogicalRole {
            next: self.right,
            previous: self.left,
        }
    }
}

/// The narrow cookie-to-direction mapping consulted on every drained event
/// in drive mode.
///
/// Always derived from a [`ButtonMap`], never mutated independently.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LogicalRole {
    next: ElementCookie,
    previous: ElementCookie,
}

impl LogicalRole {
    /// O(1) role lookup for an event's cookie.
    ///
    /// An absent role can never match, so a device without a Right or Left
    /// button simply never produces that direction.
    pub fn direction(&self, cookie: ElementCookie) -> Option<Direction> {
        if cookie.is_absent() {
            return None;
        }

        if cookie == self.next {
            Some(Direction::Next)
        } else if cookie == self.previous {
            Some(Direction::Previous)
        } else {
            None
        }
    }
}
