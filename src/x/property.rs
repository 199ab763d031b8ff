//! Properties the panel writes on its own window and reads from dockapps

use crate::core::Window;
use bitflags::bitflags;

// ============================ MotifHints ============================

bitflags! {
    /// Which fields of `_MOTIF_WM_HINTS` are meaningful
    #[derive(Default)]
    pub(crate) struct MotifFlags: u32 {
        /// The `functions` field is set
        const FUNCTIONS   = 0b0001;
        /// The `decorations` field is set
        const DECORATIONS = 0b0010;
        /// The `input_mode` field is set
        const INPUT_MODE  = 0b0100;
        /// The `status` field is set
        const STATUS      = 0b1000;
    }
}

/// Number of 32-bit values in `_MOTIF_WM_HINTS`
pub(crate) const MOTIF_HINTS_LEN: usize = 5;

/// The legacy `_MOTIF_WM_HINTS` property. Both masks at zero ask the window
/// manager for a borderless window without any window functions
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MotifHints {
    /// Fields present
    pub(crate) flags:       MotifFlags,
    /// Window functions bitmask
    pub(crate) functions:   u32,
    /// Window decorations bitmask
    pub(crate) decorations: u32,
}

impl MotifHints {
    /// Hints carrying both a function and a decoration mask
    pub(crate) fn new(functions: u32, decorations: u32) -> Self {
        Self {
            flags: MotifFlags::FUNCTIONS | MotifFlags::DECORATIONS,
            functions,
            decorations,
        }
    }

    /// Property value: flags, functions, decorations, input mode, status
    pub(crate) fn to_property(self) -> [u32; MOTIF_HINTS_LEN] {
        [self.flags.bits(), self.functions, self.decorations, 0, 0]
    }
}

// ============================== WmHints =============================

/// Number of 32-bit values in a complete `WM_HINTS`
pub(crate) const WM_HINTS_LEN: usize = 9;
/// `WM_HINTS` flag telling that the `icon_window` field is set
const ICON_WINDOW_HINT: u32 = 1 << 3;
/// Position of the `icon_window` field in `WM_HINTS`
const ICON_WINDOW_FIELD: usize = 4;

/// The icon window named by a `WM_HINTS` value, if its flag is set
pub(crate) fn icon_window_from_hints(hints: &[u32]) -> Option<Window> {
    let flags = *hints.first()?;
    if flags & ICON_WINDOW_HINT == 0 {
        return None;
    }

    hints
        .get(ICON_WINDOW_FIELD)
        .copied()
        .filter(|&window| window != x11rb::NONE)
}

// ============================== WmClass =============================

/// The instance (resource) name of a `WM_CLASS` value
pub(crate) fn instance_from_class(class: &[u8]) -> Option<String> {
    let instance = class.split(|&b| b == 0).next()?;
    (!class.is_empty()).then(|| String::from_utf8_lossy(instance).into_owned())
}

#[cfg(test)]
mod tests {
    use super::{icon_window_from_hints, instance_from_class, MotifFlags, MotifHints};

    #[test]
    fn default_hints_are_borderless() {
        assert_eq!(MotifHints::new(0, 0).to_property(), [0x03, 0, 0, 0, 0]);
    }

    #[test]
    fn masks_land_in_their_slots() {
        let hints = MotifHints::new(0x24, 0x02);
        assert!(hints.flags.contains(MotifFlags::FUNCTIONS | MotifFlags::DECORATIONS));
        assert_eq!(hints.to_property(), [0x03, 0x24, 0x02, 0, 0]);
    }

    #[test]
    fn icon_window_requires_its_flag() {
        // flags, input, state, pixmap, icon window, x, y, mask, group
        let mut hints = [0x1 | 0x8, 1, 1, 0, 0x40_0005, 0, 0, 0, 0x40_0001];
        assert_eq!(icon_window_from_hints(&hints), Some(0x40_0005));

        hints[0] = 0x1;
        assert_eq!(icon_window_from_hints(&hints), None);

        hints[0] = 0x8;
        hints[4] = 0;
        assert_eq!(icon_window_from_hints(&hints), None);
    }

    #[test]
    fn truncated_hints_have_no_icon_window() {
        assert_eq!(icon_window_from_hints(&[]), None);
        assert_eq!(icon_window_from_hints(&[0x8, 1, 1]), None);
    }

    #[test]
    fn instance_is_the_first_string_of_the_class() {
        assert_eq!(instance_from_class(b"wmclock\0WMClock\0").as_deref(), Some("wmclock"));
        assert_eq!(instance_from_class(b"xclock").as_deref(), Some("xclock"));
        assert_eq!(instance_from_class(b"\0XClock\0").as_deref(), Some(""));
        assert_eq!(instance_from_class(b""), None);
    }
}
