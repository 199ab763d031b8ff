//! The panel: every piece of state the event loop works on

use crate::{
    core::Window,
    daemon::Handshake,
    geometry::{Layout, Point},
    process::Supervisor,
    render::Image,
    swallow::{Outcome, Swallower, Timing},
    tile::Tiles,
    x::{
        event::{ProtocolError, XEvent},
        Backend,
    },
};
use anyhow::Result;
use colored::Colorize;
use std::collections::HashMap;

/// Major opcode of `GetProperty`
const GET_PROPERTY: u8 = 20;

/// Color of the panel's window background
const WINDOW_BACKGROUND: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

/// The application context, created once from the configuration
pub(crate) struct Panel {
    /// Geometry of the tiles
    layout:     Layout,
    /// The tiles in panel order
    tiles:      Tiles,
    /// Background of one tile cell
    background: Image,
    /// Pre-composed contents of each launcher window
    cells:      HashMap<Window, Image>,
    /// Performs the swallowing of dockapps
    swallower:  Swallower,
    /// Starts and reaps the tiles' processes
    supervisor: Supervisor,
    /// Tells a waiting parent that startup is done. Creations on the root
    /// window are watched until it completes
    handshake:  Handshake,
}

impl Panel {
    /// Create a new [`Panel`]
    pub(crate) fn new(
        layout: Layout,
        tiles: Tiles,
        background: &Image,
        timing: Timing,
        supervisor: Supervisor,
        handshake: Handshake,
    ) -> Self {
        let background = Image::filled(layout.tile(), WINDOW_BACKGROUND)
            .overlaid(&background.clipped(layout.tile()), Point::new(0, 0));

        Self {
            layout,
            tiles,
            background,
            cells: HashMap::new(),
            swallower: Swallower::new(layout, timing),
            supervisor,
            handshake,
        }
    }

    /// The tiles in panel order
    #[cfg(test)]
    pub(crate) const fn tiles(&self) -> &Tiles {
        &self.tiles
    }

    /// Whether new top-level windows are still being matched against tiles
    #[cfg(test)]
    pub(crate) const fn is_listening(&self) -> bool {
        !self.handshake.is_complete()
    }

    /// Startup handshake state
    #[cfg(test)]
    pub(crate) const fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Process bookkeeping
    #[cfg(test)]
    pub(crate) const fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Create the window of every launcher tile
    pub(crate) fn realize<B: Backend>(&mut self, backend: &B) -> Result<()> {
        let layout = self.layout;

        for tile in self.tiles.iter_mut().filter(|t| t.is_launcher()) {
            let at = layout.position(tile.index());
            let window = backend.create_tile_window(at, layout.tile())?;
            tile.fill(window);

            if let Some(icon) = tile.icon() {
                let cell = self
                    .background
                    .overlaid(icon, layout.centered(icon.dimension()));
                self.cells.insert(window, cell);
            }

            log::debug!(
                "created launcher Window({:#0x}) at {} for `{}`",
                window,
                at,
                tile.command()
            );
        }

        backend.flush()
    }

    /// Start every dockapp. Startup is complete right away when there are none
    pub(crate) fn start<B: Backend>(&mut self, backend: &B) -> Result<()> {
        for tile in self.tiles.iter_mut().filter(|t| t.is_dockapp()) {
            self.supervisor.start(tile)?;
        }

        if !self.tiles.has_dockapps() {
            self.finish_swallowing(backend)?;
        }

        Ok(())
    }

    /// React to one event from the server
    pub(crate) fn handle_event<B: Backend>(&mut self, backend: &B, event: XEvent) -> Result<()> {
        match event {
            XEvent::CreateNotify { window, parent } => {
                log::trace!("CreateNotify: Window({:#0x}) in Window({:#0x})", window, parent);
                self.handle_create(backend, window)
            },
            XEvent::Expose { window, count } => {
                if count == 0 {
                    self.handle_expose(backend, window)?;
                }
                Ok(())
            },
            XEvent::ButtonPress { window, button } => self.handle_button_press(window, button),
            XEvent::Error(error) => {
                Self::handle_error(&error);
                Ok(())
            },
            XEvent::Ignored => Ok(()),
        }
    }

    /// Swallow `window` if it belongs to a dockapp that is still missing
    fn handle_create<B: Backend>(&mut self, backend: &B, window: Window) -> Result<()> {
        if self.handshake.is_complete() || window == backend.panel() {
            return Ok(());
        }

        let name = match backend.resource_name(window)? {
            Some(name) => name,
            None => return Ok(()),
        };
        log::debug!("created Window({:#0x}) with resource name `{}`", window, name);

        let index = match self.tiles.waiting_for(&name) {
            Some(index) => index,
            None => return Ok(()),
        };

        match self.swallower.swallow(backend, window, index)? {
            Outcome::Swallowed { icon, placement } => {
                log::debug!("parked main Window({:#0x}) at {}", window, placement.main);
                if let Some(tile) = self.tiles.get_mut(index) {
                    tile.fill(icon);
                }
            },
            Outcome::NoIconWindow => return Ok(()),
        }

        if self.tiles.all_dockapps_swallowed() {
            self.finish_swallowing(backend)?;
        }

        Ok(())
    }

    /// Stop watching for windows and release a waiting parent
    fn finish_swallowing<B: Backend>(&mut self, backend: &B) -> Result<()> {
        log::info!("{}", "all dockapps swallowed".green());

        backend.watch_creations(false)?;
        backend.flush()?;
        self.handshake.notify();

        Ok(())
    }

    /// Redraw the backgrounds of the panel or the contents of a launcher
    fn handle_expose<B: Backend>(&self, backend: &B, window: Window) -> Result<()> {
        if window == backend.panel() {
            for tile in self.tiles.iter().filter(|t| !t.is_launcher()) {
                backend.draw_image(window, &self.background, self.layout.position(tile.index()))?;
            }
        } else if let Some(cell) = self.cells.get(&window) {
            backend.draw_image(window, cell, Point::new(0, 0))?;
        }

        Ok(())
    }

    /// Run the command of the launcher that was clicked
    fn handle_button_press(&mut self, window: Window, button: u8) -> Result<()> {
        let command = match self.tiles.launcher_at(window) {
            Some(tile) => tile.command().to_owned(),
            None => return Ok(()),
        };

        log::debug!("button {} pressed on launcher Window({:#0x})", button, window);
        self.supervisor.launch(&command)?;

        Ok(())
    }

    /// Log an error of a request that was sent unchecked
    fn handle_error(error: &ProtocolError) {
        if error.is_bad_window() || error.major_opcode == GET_PROPERTY {
            log::trace!(
                "ignoring {:?} error for request {} on {:#0x}",
                error.kind,
                error.major_opcode,
                error.bad_value
            );
        } else {
            log::debug!(
                "X11 error ({}, {}, {:#0x}): {:?}",
                error.major_opcode,
                error.minor_opcode,
                error.bad_value,
                error.kind
            );
        }
    }

    /// Collect exited children
    pub(crate) fn reap_children(&mut self) {
        let reaped = self.supervisor.reap(&mut self.tiles);
        log::trace!("reaped {} children", reaped);
    }

    /// Ask every dockapp to terminate
    pub(crate) fn terminate_children(&self) {
        log::debug!("terminating dockapps");
        self.supervisor.terminate_all(&self.tiles);
    }
}
