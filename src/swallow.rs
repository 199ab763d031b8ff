//! Swallowing a dockapp into the panel
//!
//! A dockapp creates a top-level window and, usually a little later, an icon
//! window which it announces through its `WM_HINTS`. Swallowing takes both
//! windows away from the root window and reparents them into the panel: the
//! icon window centered in its tile, the main window parked two tiles off the
//! visible grid where it stays alive without being seen.
//!
//! A running window manager reacts to the same windows and may try to frame
//! them. When one is detected the windows are first unmapped and reparented
//! with short pauses in between so it can drop its claim. The final
//! reparent-and-map pass is always performed, which repeats the reparent in
//! that case. This is a timing heuristic against reparenting races in some
//! window managers, not a protocol guarantee, so the pauses are configurable.

use crate::{
    config::GlobalSettings,
    core::Window,
    geometry::{Dimension, Layout, Point},
    x::Backend,
};
use anyhow::Result;
use colored::Colorize;
use std::{thread, time::Duration};

// ============================== Timing ==============================

/// Pauses and retries used while swallowing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timing {
    /// Pause after detecting a window manager, before reading the hints
    pub(crate) wm_settle:     Duration,
    /// Number of times `WM_HINTS` is read looking for the icon window
    pub(crate) icon_attempts: u32,
    /// Pause after each read that found no icon window
    pub(crate) icon_retry:    Duration,
    /// Each of the two pauses of the window-manager workaround
    pub(crate) reparent:      Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            wm_settle:     Duration::from_millis(100),
            icon_attempts: 2,
            icon_retry:    Duration::from_millis(100),
            reparent:      Duration::from_millis(50),
        }
    }
}

impl From<&GlobalSettings> for Timing {
    fn from(settings: &GlobalSettings) -> Self {
        Self {
            wm_settle:     Duration::from_millis(settings.wm_settle_delay),
            icon_attempts: settings.icon_attempts.max(1),
            icon_retry:    Duration::from_millis(settings.icon_retry_delay),
            reparent:      Duration::from_millis(settings.reparent_delay),
        }
    }
}

// ============================= Placement ============================

/// Where the two windows of a dockapp go inside the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    /// The icon window, centered in its tile
    pub(crate) icon: Point,
    /// The main window, parked off the grid
    pub(crate) main: Point,
}

impl Placement {
    /// Resolve the placement of an icon window of `size` in tile `index`
    pub(crate) const fn resolve(layout: Layout, index: usize, size: Dimension) -> Self {
        let icon = layout.centered_in(index, size);
        Self {
            icon,
            main: layout.parked(icon),
        }
    }
}

// ============================== Outcome =============================

/// Result of one swallow attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Both windows now live in the panel
    Swallowed {
        /// The icon window, which is what the tile holds
        icon:      Window,
        /// Where the windows were put
        placement: Placement,
    },
    /// The main window never announced an icon window
    NoIconWindow,
}

// ============================= Swallower ============================

/// Runs the swallowing sequence for one (window, tile) pair at a time
#[derive(Debug, Clone, Copy)]
pub(crate) struct Swallower {
    /// Geometry of the tiles
    layout: Layout,
    /// Pauses and retries
    timing: Timing,
}

impl Swallower {
    /// Create a new [`Swallower`]
    pub(crate) const fn new(layout: Layout, timing: Timing) -> Self {
        Self { layout, timing }
    }

    /// Swallow the dockapp whose main window is `main` into tile `index`
    pub(crate) fn swallow<B: Backend>(&self, backend: &B, main: Window, index: usize) -> Result<Outcome> {
        log::debug!(
            "swallowing dockapp with main Window({:#0x}) into tile {}",
            main,
            index
        );

        // Snapshot; not re-checked for the rest of the sequence
        let wm_running = backend.window_manager_running()?;
        if wm_running {
            log::warn!(
                "{}, swallowing Window({:#0x}) with workaround",
                "window manager detected".yellow(),
                main
            );
            self.pause(self.timing.wm_settle);
        }

        let icon = match self.discover_icon(backend, main)? {
            Some(icon) => icon,
            None => {
                log::warn!("Window({:#0x}) has no icon window, skipping", main);
                return Ok(Outcome::NoIconWindow);
            },
        };

        backend.set_border_width(icon, 0)?;

        let size = backend.window_size(icon)?;
        log::debug!("icon Window({:#0x}) has size {}", icon, size);
        let placement = Placement::resolve(self.layout, index, size);

        self.reparent(backend, main, icon, placement, wm_running)?;

        log::debug!(
            "swallowed icon Window({:#0x}) at {}",
            icon,
            placement.icon
        );

        Ok(Outcome::Swallowed { icon, placement })
    }

    /// Read the hints of `main` until they name an icon window or the attempts
    /// run out
    fn discover_icon<B: Backend>(&self, backend: &B, main: Window) -> Result<Option<Window>> {
        for attempt in 1..=self.timing.icon_attempts {
            if let Some(icon) = backend.icon_window(main)? {
                return Ok(Some(icon));
            }

            log::debug!(
                "waiting for icon window of Window({:#0x}) ({}/{})",
                main,
                attempt,
                self.timing.icon_attempts
            );
            self.pause(self.timing.icon_retry);
        }

        Ok(None)
    }

    /// Move both windows into the panel
    fn reparent<B: Backend>(
        &self,
        backend: &B,
        main: Window,
        icon: Window,
        placement: Placement,
        wm_running: bool,
    ) -> Result<()> {
        if wm_running {
            backend.unmap_window(main)?;
            backend.unmap_window(icon)?;
            backend.flush()?;
            self.pause(self.timing.reparent);

            backend.reparent_into_panel(main, placement.main)?;
            backend.reparent_into_panel(icon, placement.icon)?;
            backend.flush()?;
            self.pause(self.timing.reparent);
        }

        backend.reparent_into_panel(main, placement.main)?;
        backend.reparent_into_panel(icon, placement.icon)?;
        backend.map_raised(main)?;
        backend.map_raised(icon)?;
        backend.flush()
    }

    /// Block the event loop for `duration`
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}
