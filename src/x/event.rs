//! X11 Events

use crate::core::Window;
use x11rb::protocol::{ErrorKind, Event};

// ============================== XEvent ==============================

/// Low-level wrapper around the X-server events the panel reacts to
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XEvent {
    /// A window was created as a child of the root window
    CreateNotify {
        /// The new window
        window: Window,
        /// Its parent
        parent: Window,
    },
    /// Part of a window needs to be redrawn
    Expose {
        /// The window to redraw
        window: Window,
        /// Number of `Expose` events still following for this window
        count:  u16,
    },
    /// A mouse button was pressed in a window selecting for it
    ButtonPress {
        /// The event window
        window: Window,
        /// The pressed button
        button: u8,
    },
    /// An error for a request sent without waiting for its reply
    Error(ProtocolError),
    /// Anything the panel does not handle
    Ignored,
}

/// A protocol error reported by the server
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProtocolError {
    /// Kind of the error
    pub(crate) kind:         ErrorKind,
    /// Major opcode of the failed request
    pub(crate) major_opcode: u8,
    /// Minor opcode of the failed request
    pub(crate) minor_opcode: u16,
    /// Resource ID or value that caused the error
    pub(crate) bad_value:    u32,
}

impl ProtocolError {
    /// Whether this is a request against a window that no longer exists
    pub(crate) fn is_bad_window(&self) -> bool {
        self.kind == ErrorKind::Window
    }
}

impl From<Event> for XEvent {
    fn from(event: Event) -> Self {
        match event {
            Event::CreateNotify(e) => Self::CreateNotify {
                window: e.window,
                parent: e.parent,
            },
            Event::Expose(e) => Self::Expose {
                window: e.window,
                count:  e.count,
            },
            Event::ButtonPress(e) => Self::ButtonPress {
                window: e.event,
                button: e.detail,
            },
            Event::Error(e) => Self::Error(ProtocolError {
                kind:         e.error_kind,
                major_opcode: e.major_opcode,
                minor_opcode: e.minor_opcode,
                bad_value:    e.bad_value,
            }),
            _ => Self::Ignored,
        }
    }
}
