//! Tile images: decoding, compositing and conversion to X11 pixel data
//!
//! Images are decoded once into RGBA buffers. Everything drawn on the panel is
//! composed here in software and then sent to the server as `ZPixmap` strips.

use crate::{
    error::Error,
    geometry::{Dimension, Point},
};
use image::{imageops, Rgba, RgbaImage};
use std::path::Path;
use x11rb::protocol::xproto::ImageOrder;

/// A decoded image
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Image {
    /// RGBA pixel data
    pixels: RgbaImage,
}

impl Image {
    /// Decode the image at `path`
    pub(crate) fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        log::debug!("loading image {}", path.display());

        let pixels = image::open(path)
            .map_err(|source| Error::Image {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();

        Ok(Self { pixels })
    }

    /// Wrap an already decoded buffer
    pub(crate) const fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// An image of a single color
    pub(crate) fn filled(size: Dimension, rgba: [u8; 4]) -> Self {
        Self::from_rgba(RgbaImage::from_pixel(size.width, size.height, Rgba(rgba)))
    }

    /// Size of the decoded image
    pub(crate) fn dimension(&self) -> Dimension {
        Dimension::new(self.pixels.width(), self.pixels.height())
    }

    /// Return the RGBA value of the pixel at `(x, y)`
    #[cfg(test)]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| self.pixels.get_pixel(x, y).0)
    }

    /// Return the top-left part of the image that fits in `size`
    pub(crate) fn clipped(&self, size: Dimension) -> Self {
        let width = size.width.min(self.pixels.width());
        let height = size.height.min(self.pixels.height());
        Self::from_rgba(imageops::crop_imm(&self.pixels, 0, 0, width, height).to_image())
    }

    /// Return a copy of this image with `top` blended over it at `at`. Parts of
    /// `top` falling outside this image are dropped
    pub(crate) fn overlaid(&self, top: &Self, at: Point) -> Self {
        let mut out = self.pixels.clone();
        imageops::overlay(&mut out, &top.pixels, i64::from(at.x), i64::from(at.y));
        Self::from_rgba(out)
    }

    /// Split the image into horizontal strips whose `ZPixmap` data fits in
    /// `max_bytes` each, paired with the row each strip starts at. A strip is
    /// never less than one row high
    pub(crate) fn strips(&self, max_bytes: usize) -> Vec<(u32, Self)> {
        let (width, height) = self.pixels.dimensions();
        let row_bytes = (width as usize * 4).max(1);
        let rows = (max_bytes / row_bytes).clamp(1, height.max(1) as usize) as u32;

        (0..height)
            .step_by(rows as usize)
            .map(|top| {
                let strip = imageops::crop_imm(&self.pixels, 0, top, width, rows.min(height - top));
                (top, Self::from_rgba(strip.to_image()))
            })
            .collect()
    }

    /// Pack the pixels as a 32 bits-per-pixel `ZPixmap` for a TrueColor visual
    /// with the given byte order. Alpha is dropped; the padding byte is zero
    pub(crate) fn to_zpixmap(&self, order: ImageOrder) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.pixels.as_raw().len());
        for Rgba([r, g, b, _]) in self.pixels.pixels() {
            if order == ImageOrder::MSB_FIRST {
                data.extend_from_slice(&[0, *r, *g, *b]);
            } else {
                data.extend_from_slice(&[*b, *g, *r, 0]);
            }
        }
        data
    }
}
