//! Base types used throughout [`pmdock`]

// Re-export
pub(crate) use x11rb::protocol::xproto::Window;

/// Panel window's title (`WM_NAME`)
pub(crate) const PANEL_TITLE: &str = "PMDock";
/// Panel window's `WM_CLASS` instance name
pub(crate) const PANEL_INSTANCE: &str = "pmdock";
/// Panel window's `WM_CLASS` class name
pub(crate) const PANEL_CLASS: &str = "PMDock";

/// Background used when none is given on the command line
pub(crate) const DEFAULT_BACKGROUND: &str = "tile-default.png";
/// Edge length of a tile when none is given on the command line
pub(crate) const DEFAULT_TILE_SIZE: u32 = 64;

/// Value of `_NET_WM_DESKTOP` meaning "every desktop"
pub(crate) const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// `WM_CLASS` property value: instance and class, each null terminated
pub(crate) fn wm_class_value(instance: &str, class: &str) -> Vec<u8> {
    format!("{}\0{}\0", instance, class).into_bytes()
}
