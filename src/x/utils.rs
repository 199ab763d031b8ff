//! Various utilities specifically dealing with X

use crate::error::Error;
use x11rb::{
    protocol::xproto::{ImageOrder, Screen, Setup},
    rust_connection::RustConnection,
};

// ============================= XUtility =============================

/// Wrapper to do basic X11 commands
pub(crate) struct XUtility;

impl XUtility {
    /// Setup the X11 [`Connection`](RustConnection) to `$DISPLAY`
    pub(crate) fn setup_connection() -> Result<(RustConnection, usize), Error> {
        RustConnection::connect(None).map_err(Error::Connection)
    }

    /// Check that images can be drawn on `screen` as 32 bits-per-pixel
    /// `ZPixmap`s, returning the server's byte order
    pub(crate) fn pixel_layout(setup: &Setup, screen: &Screen) -> Result<ImageOrder, Error> {
        let depth = screen.root_depth;
        let bits_per_pixel = setup
            .pixmap_formats
            .iter()
            .find(|format| format.depth == depth)
            .map_or(0, |format| format.bits_per_pixel);

        if bits_per_pixel == 32 && depth >= 24 {
            Ok(setup.image_byte_order)
        } else {
            Err(Error::UnsupportedVisual { depth, bits_per_pixel })
        }
    }
}
