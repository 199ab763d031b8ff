//! Structures used to map tiles onto the panel

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================== Point ==============================
// ====================================================================

/// A position relative to the top-left corner of some parent window
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub(crate) struct Point {
    /// X-coordinate
    pub(crate) x: i32,
    /// Y-coordinate
    pub(crate) y: i32,
}

impl Point {
    /// Create a new [`Point`]
    pub(crate) const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return the `x` and `y` coordinates as a tuple
    pub(crate) const fn as_tuple(self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Return this [`Point`] moved by the given offset
    pub(crate) const fn offset(self, by: Self) -> Self {
        Self {
            x: self.x + by.x,
            y: self.y + by.y,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "x: {}, y: {}", self.x, self.y)
    }
}

// ============================= Dimension ===========================
// ====================================================================

/// A `width` and a `height`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct Dimension {
    /// The width of the area
    pub(crate) width:  u32,
    /// The height of the area
    pub(crate) height: u32,
}

impl Dimension {
    /// Create a new [`Dimension`]
    pub(crate) const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A square [`Dimension`]
    pub(crate) const fn square(edge: u32) -> Self {
        Self::new(edge, edge)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ============================ Orientation ===========================
// ====================================================================

/// Axis the tiles are laid out along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Orientation {
    /// Tiles form a row
    Horizontal,
    /// Tiles form a column
    Vertical,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Vertical
    }
}

// ============================== Layout ==============================
// ====================================================================

/// The geometry shared by every tile of the panel.
///
/// Creation, redraw and swallow placement all go through [`Layout::position`]
/// so a tile is always drawn where its window lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    /// Row or column
    pub(crate) orientation: Orientation,
    /// Length of a tile's edge in pixels
    pub(crate) tile_size:   u32,
}

impl Layout {
    /// Create a new [`Layout`]
    pub(crate) const fn new(orientation: Orientation, tile_size: u32) -> Self {
        Self { orientation, tile_size }
    }

    /// Whether tiles form a row
    pub(crate) const fn is_horizontal(self) -> bool {
        matches!(self.orientation, Orientation::Horizontal)
    }

    /// Top-left corner of the tile at `index`
    pub(crate) const fn position(self, index: usize) -> Point {
        let along = (index as u32 * self.tile_size) as i32;
        if self.is_horizontal() {
            Point::new(along, 0)
        } else {
            Point::new(0, along)
        }
    }

    /// Size of a single tile
    pub(crate) const fn tile(self) -> Dimension {
        Dimension::square(self.tile_size)
    }

    /// Size of a panel holding `count` tiles
    pub(crate) const fn panel(self, count: usize) -> Dimension {
        let along = count as u32 * self.tile_size;
        if self.is_horizontal() {
            Dimension::new(along, self.tile_size)
        } else {
            Dimension::new(self.tile_size, along)
        }
    }

    /// Offset that centers something of `size` inside a tile. An axis on which
    /// it does not fit is pinned to the tile's origin
    pub(crate) const fn centered(self, size: Dimension) -> Point {
        Point::new(
            center_axis(self.tile_size, size.width),
            center_axis(self.tile_size, size.height),
        )
    }

    /// Where the window of `size` goes when centered in the tile at `index`
    pub(crate) const fn centered_in(self, index: usize, size: Dimension) -> Point {
        self.position(index).offset(self.centered(size))
    }

    /// Where a dockapp's main window is parked: two tiles away on the cross
    /// axis, lined up with its icon window on the layout axis
    pub(crate) const fn parked(self, icon: Point) -> Point {
        let away = (self.tile_size * 2) as i32;
        if self.is_horizontal() {
            Point::new(icon.x, away)
        } else {
            Point::new(away, icon.y)
        }
    }
}

/// Center a length inside a tile edge, clamping to zero when it overflows
const fn center_axis(edge: u32, length: u32) -> i32 {
    if length < edge {
        ((edge - length) / 2) as i32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{Dimension, Layout, Orientation, Point};

    #[test]
    fn positions_step_one_tile_along_the_axis() {
        for (orientation, size) in [(Orientation::Horizontal, 64), (Orientation::Vertical, 48)] {
            let layout = Layout::new(orientation, size);
            for i in 0..16 {
                let (a, b) = (layout.position(i), layout.position(i + 1));
                match orientation {
                    Orientation::Horizontal => {
                        assert_eq!(b.x - a.x, size as i32);
                        assert_eq!(b.y - a.y, 0);
                    },
                    Orientation::Vertical => {
                        assert_eq!(b.x - a.x, 0);
                        assert_eq!(b.y - a.y, size as i32);
                    },
                }
            }
        }
    }

    #[test]
    fn first_tile_is_at_the_origin() {
        assert_eq!(Layout::new(Orientation::Horizontal, 64).position(0), Point::new(0, 0));
        assert_eq!(Layout::new(Orientation::Vertical, 64).position(0), Point::new(0, 0));
    }

    #[test]
    fn panel_size_follows_tile_count() {
        let row = Layout::new(Orientation::Horizontal, 64);
        assert_eq!(row.panel(3), Dimension::new(192, 64));

        let column = Layout::new(Orientation::Vertical, 56);
        assert_eq!(column.panel(4), Dimension::new(56, 224));
    }

    #[test]
    fn smaller_windows_are_centered() {
        let layout = Layout::new(Orientation::Horizontal, 64);
        assert_eq!(layout.centered(Dimension::new(48, 48)), Point::new(8, 8));
        assert_eq!(layout.centered(Dimension::new(64, 30)), Point::new(0, 17));
        assert_eq!(layout.centered_in(2, Dimension::new(48, 48)), Point::new(136, 8));
    }

    #[test]
    fn oversized_windows_clamp_to_the_tile_origin() {
        let layout = Layout::new(Orientation::Vertical, 64);
        assert_eq!(layout.centered(Dimension::new(80, 48)), Point::new(0, 8));
        assert_eq!(layout.centered(Dimension::new(32, 100)), Point::new(16, 0));
        assert_eq!(layout.centered(Dimension::new(90, 90)), Point::new(0, 0));
    }

    #[test]
    fn main_windows_are_parked_off_the_grid() {
        let row = Layout::new(Orientation::Horizontal, 64);
        assert_eq!(row.parked(Point::new(72, 8)), Point::new(72, 128));

        let column = Layout::new(Orientation::Vertical, 64);
        assert_eq!(column.parked(Point::new(8, 72)), Point::new(128, 72));
    }
}
