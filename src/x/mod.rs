//! Everything that talks to the X server

pub(crate) mod event;
pub(crate) mod property;
pub(crate) mod utils;
pub(crate) mod xconnection;

#[cfg(test)]
pub(crate) mod testing;

use crate::{
    core::Window,
    geometry::{Dimension, Point},
    render::Image,
};
use anyhow::Result;

/// The requests the panel makes of the display server.
///
/// Errors returned from these are connection failures and are fatal. Protocol
/// errors caused by a window vanishing mid-sequence are not reported here:
/// requests are sent unchecked and their errors arrive in the event queue.
pub(crate) trait Backend {
    /// The panel's own top-level window
    fn panel(&self) -> Window;

    /// Whether `_NET_SUPPORTING_WM_CHECK` is set on the root window
    fn window_manager_running(&self) -> Result<bool>;

    /// `WM_CLASS` instance name of `window`, if it has class hints
    fn resource_name(&self, window: Window) -> Result<Option<String>>;

    /// Icon window announced in the `WM_HINTS` of `window`
    fn icon_window(&self, window: Window) -> Result<Option<Window>>;

    /// Current size of `window`; zero when it cannot be queried
    fn window_size(&self, window: Window) -> Result<Dimension>;

    /// Change the border width of `window`
    fn set_border_width(&self, window: Window, width: u32) -> Result<()>;

    /// Unmap `window`
    fn unmap_window(&self, window: Window) -> Result<()>;

    /// Make `window` a child of the panel at `at`
    fn reparent_into_panel(&self, window: Window, at: Point) -> Result<()>;

    /// Raise `window` to the top of its siblings and map it
    fn map_raised(&self, window: Window) -> Result<()>;

    /// Send all pending requests
    fn flush(&self) -> Result<()>;

    /// Start or stop receiving `CreateNotify` for children of the root window
    fn watch_creations(&self, enable: bool) -> Result<()>;

    /// Create and map a child window of the panel covering one tile
    fn create_tile_window(&self, at: Point, size: Dimension) -> Result<Window>;

    /// Draw `image` on `drawable` with its top-left corner at `at`
    fn draw_image(&self, drawable: Window, image: &Image, at: Point) -> Result<()>;
}
