//! The slots of the panel

use crate::{core::Window, render::Image};
use nix::unistd::Pid;
use strum_macros::{Display, EnumString};

/// What a tile hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum TileKind {
    /// An external application whose icon window gets swallowed
    Dockapp,
    /// An icon that runs a command when clicked
    Launcher,
}

/// One fixed-size cell of the panel
#[derive(Debug)]
pub(crate) struct Tile {
    /// Dockapp or launcher
    kind:          TileKind,
    /// Position in the panel
    index:         usize,
    /// Command line run for this tile
    command:       String,
    /// `WM_CLASS` instance name of the dockapp's main window
    resource_name: Option<String>,
    /// Icon drawn on a launcher
    icon:          Option<Image>,
    /// Swallowed icon window (dockapp) or the tile's own window (launcher)
    window:        Option<Window>,
    /// Process running `command`
    pid:           Option<Pid>,
}

impl Tile {
    /// Create a dockapp tile
    pub(crate) fn dockapp<C, R>(index: usize, command: C, resource_name: R) -> Self
    where
        C: Into<String>,
        R: Into<String>,
    {
        Self {
            kind: TileKind::Dockapp,
            index,
            command: command.into(),
            resource_name: Some(resource_name.into()),
            icon: None,
            window: None,
            pid: None,
        }
    }

    /// Create a launcher tile
    pub(crate) fn launcher<C: Into<String>>(index: usize, command: C, icon: Image) -> Self {
        Self {
            kind: TileKind::Launcher,
            index,
            command: command.into(),
            resource_name: None,
            icon: Some(icon),
            window: None,
            pid: None,
        }
    }

    /// Dockapp or launcher
    pub(crate) const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Whether the tile hosts a dockapp
    pub(crate) const fn is_dockapp(&self) -> bool {
        matches!(self.kind, TileKind::Dockapp)
    }

    /// Whether the tile is a launcher
    pub(crate) const fn is_launcher(&self) -> bool {
        matches!(self.kind, TileKind::Launcher)
    }

    /// Position in the panel
    pub(crate) const fn index(&self) -> usize {
        self.index
    }

    /// Command line run for this tile
    pub(crate) fn command(&self) -> &str {
        &self.command
    }

    /// Resource name a dockapp is recognized by
    pub(crate) fn resource_name(&self) -> Option<&str> {
        self.resource_name.as_deref()
    }

    /// Icon of a launcher
    pub(crate) const fn icon(&self) -> Option<&Image> {
        self.icon.as_ref()
    }

    /// The window held by this tile, if any
    pub(crate) const fn window(&self) -> Option<Window> {
        self.window
    }

    /// Whether a window has been assigned to this tile
    pub(crate) const fn is_filled(&self) -> bool {
        self.window.is_some()
    }

    /// Process running the tile's command
    pub(crate) const fn pid(&self) -> Option<Pid> {
        self.pid
    }

    /// Assign the tile's window. A tile is filled at most once; later calls
    /// leave it untouched and return `false`
    pub(crate) fn fill(&mut self, window: Window) -> bool {
        if self.window.is_some() {
            log::debug!(
                "tile {} already holds Window({:#0x}); ignoring Window({:#0x})",
                self.index,
                self.window.unwrap_or_default(),
                window
            );
            return false;
        }

        self.window = Some(window);
        true
    }

    /// Record the process started for this tile
    pub(crate) fn set_pid(&mut self, pid: Option<Pid>) {
        self.pid = pid;
    }

    /// Whether this dockapp tile is waiting for a window named `resource_name`
    pub(crate) fn accepts(&self, resource_name: &str) -> bool {
        self.is_dockapp() && !self.is_filled() && self.resource_name() == Some(resource_name)
    }
}

/// The ordered tiles of the panel
#[derive(Debug, Default)]
pub(crate) struct Tiles {
    /// Tiles by index
    tiles: Vec<Tile>,
}

impl Tiles {
    /// Create a new [`Tiles`]
    pub(crate) fn new(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    /// Number of tiles
    pub(crate) fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Iterate over the tiles in index order
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Iterate mutably over the tiles in index order
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    /// Get the tile at `index`
    pub(crate) fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Get the tile at `index` mutably
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    /// First unfilled dockapp waiting for `resource_name`
    pub(crate) fn waiting_for(&self, resource_name: &str) -> Option<usize> {
        self.tiles
            .iter()
            .position(|tile| tile.accepts(resource_name))
    }

    /// The launcher whose window is `window`
    pub(crate) fn launcher_at(&self, window: Window) -> Option<&Tile> {
        self.tiles
            .iter()
            .find(|tile| tile.is_launcher() && tile.window() == Some(window))
    }

    /// Whether the panel hosts any dockapps
    pub(crate) fn has_dockapps(&self) -> bool {
        self.tiles.iter().any(Tile::is_dockapp)
    }

    /// Whether every dockapp tile holds its icon window
    pub(crate) fn all_dockapps_swallowed(&self) -> bool {
        self.tiles
            .iter()
            .filter(|tile| tile.is_dockapp())
            .all(Tile::is_filled)
    }
}

#[cfg(test)]
mod tests {
    use super::{Tile, TileKind, Tiles};
    use crate::{geometry::Dimension, render::Image};
    use std::str::FromStr;

    fn icon() -> Image {
        Image::filled(Dimension::square(16), [0, 0, 0, 0xff])
    }

    fn fill(tiles: &mut Tiles, index: usize, window: u32) {
        assert!(tiles.get_mut(index).unwrap().fill(window));
    }

    fn tiles() -> Tiles {
        Tiles::new(vec![
            Tile::dockapp(0, "wmclock", "wmclock"),
            Tile::launcher(1, "xterm", icon()),
            Tile::dockapp(2, "wmcpu", "wmcpu"),
        ])
    }

    #[test]
    fn kinds_parse_from_their_flag_names() {
        assert_eq!(TileKind::from_str("dockapp"), Ok(TileKind::Dockapp));
        assert_eq!(TileKind::from_str("launcher"), Ok(TileKind::Launcher));
        assert!(TileKind::from_str("applet").is_err());
        assert_eq!(TileKind::Launcher.to_string(), "launcher");
    }

    #[test]
    fn a_tile_is_filled_only_once() {
        let mut tile = Tile::dockapp(0, "wmclock", "wmclock");
        assert!(!tile.is_filled());
        assert!(tile.fill(0x40_0001));
        assert!(!tile.fill(0x50_0001));
        assert_eq!(tile.window(), Some(0x40_0001));
    }

    #[test]
    fn matching_skips_filled_tiles_and_launchers() {
        let mut tiles = tiles();
        assert_eq!(tiles.waiting_for("wmcpu"), Some(2));
        assert_eq!(tiles.waiting_for("xterm"), None);
        assert_eq!(tiles.waiting_for("wmclock"), Some(0));

        fill(&mut tiles, 0, 0x40_0001);
        assert_eq!(tiles.waiting_for("wmclock"), None);
    }

    #[test]
    fn duplicate_names_fill_in_index_order() {
        let mut tiles = Tiles::new(vec![
            Tile::dockapp(0, "wmmon", "wmmon"),
            Tile::dockapp(1, "wmmon -s", "wmmon"),
        ]);

        assert_eq!(tiles.waiting_for("wmmon"), Some(0));
        fill(&mut tiles, 0, 1);
        assert_eq!(tiles.waiting_for("wmmon"), Some(1));
    }

    #[test]
    fn swallowed_once_every_dockapp_is_filled() {
        let mut tiles = tiles();
        assert!(tiles.has_dockapps());
        assert!(!tiles.all_dockapps_swallowed());

        fill(&mut tiles, 1, 0x10);
        assert!(!tiles.all_dockapps_swallowed());
        fill(&mut tiles, 0, 0x20);
        fill(&mut tiles, 2, 0x30);
        assert!(tiles.all_dockapps_swallowed());
    }

    #[test]
    fn launchers_are_found_by_window() {
        let mut tiles = tiles();
        fill(&mut tiles, 1, 0x77);
        assert_eq!(tiles.launcher_at(0x77).map(Tile::index), Some(1));
        assert!(tiles.launcher_at(0x78).is_none());
    }
}
