//! Errors found throughout this crate

use thiserror::Error;
use x11rb::errors::ConnectError;

/// Errors that occur while configuring the panel or interacting with the
/// X-Server
#[derive(Debug, Error)]
pub(crate) enum Error {
    /// Failure to connect to the server
    #[error("failed to connect to the X11 server: {0}")]
    Connection(#[from] ConnectError),

    /// The tile definitions or an option given on the command line are invalid
    #[error("{0}")]
    Config(String),

    /// An image could not be read or decoded
    #[error("failed to load image {path}: {source}")]
    Image {
        /// Path given for the image
        path:   String,
        /// Error from the decoder
        #[source]
        source: image::ImageError,
    },

    /// A child process could not be created
    #[error("failed to fork `{command}`: {source}")]
    Spawn {
        /// The command line of the tile
        command: String,
        /// Error from the OS
        #[source]
        source:  std::io::Error,
    },

    /// The root window's depth has no 32-bit pixel format to draw images with
    #[error("unsupported visual: depth {depth} uses {bits_per_pixel} bits per pixel")]
    UnsupportedVisual {
        /// Depth of the root window
        depth:          u8,
        /// Bits per pixel of the matching pixmap format
        bits_per_pixel: u8,
    },
}

impl Error {
    /// Create a configuration error from anything displayable
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the usage text should be printed along with this error
    pub(crate) const fn wants_usage(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn config_errors_print_usage() {
        let err = Error::config("-t requires preceding -c");
        assert!(err.wants_usage());
        assert_eq!(err.to_string(), "-t requires preceding -c");
    }

    #[test]
    fn visual_errors_do_not_print_usage() {
        let err = Error::UnsupportedVisual { depth: 16, bits_per_pixel: 16 };
        assert!(!err.wants_usage());
    }
}
