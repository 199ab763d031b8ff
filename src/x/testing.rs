//! A [`Backend`] that records requests instead of sending them

use super::Backend;
use crate::{
    core::Window,
    geometry::{Dimension, Point},
    render::Image,
};
use anyhow::Result;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

/// A request the panel made
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Request {
    BorderWidth(Window, u32),
    Unmap(Window),
    Reparent(Window, Point),
    MapRaised(Window),
    Flush,
    WatchCreations(bool),
    CreateTileWindow(Window, Point, Dimension),
    Draw(Window, Image, Point),
}

/// Scripted display server
#[derive(Debug)]
pub(crate) struct Recorder {
    panel:        Window,
    wm_running:   bool,
    names:        HashMap<Window, String>,
    /// Main window => (icon window, number of queries answered with nothing)
    icons:        HashMap<Window, (Window, usize)>,
    sizes:        HashMap<Window, Dimension>,
    icon_queries: RefCell<HashMap<Window, usize>>,
    next_id:      Cell<Window>,
    requests:     RefCell<Vec<Request>>,
}

impl Recorder {
    pub(crate) fn new(panel: Window) -> Self {
        Self {
            panel,
            wm_running: false,
            names: HashMap::new(),
            icons: HashMap::new(),
            sizes: HashMap::new(),
            icon_queries: RefCell::new(HashMap::new()),
            next_id: Cell::new(panel + 1),
            requests: RefCell::new(vec![]),
        }
    }

    /// Pretend a window manager is running
    pub(crate) fn with_wm(mut self) -> Self {
        self.wm_running = true;
        self
    }

    /// A main window with class hints naming it `name`
    pub(crate) fn with_window(mut self, window: Window, name: &str) -> Self {
        self.names.insert(window, name.to_owned());
        self
    }

    /// `main` announces `icon` after `misses` queries came back empty
    pub(crate) fn with_icon(mut self, main: Window, icon: Window, misses: usize, size: Dimension) -> Self {
        self.icons.insert(main, (icon, misses));
        self.sizes.insert(icon, size);
        self
    }

    /// Everything requested so far, clearing the log
    pub(crate) fn take(&self) -> Vec<Request> {
        self.requests.borrow_mut().drain(..).collect()
    }

    /// How often the hints of `window` were read
    pub(crate) fn icon_queries(&self, window: Window) -> usize {
        self.icon_queries.borrow().get(&window).copied().unwrap_or(0)
    }

    fn push(&self, request: Request) {
        self.requests.borrow_mut().push(request);
    }
}

impl Backend for Recorder {
    fn panel(&self) -> Window {
        self.panel
    }

    fn window_manager_running(&self) -> Result<bool> {
        Ok(self.wm_running)
    }

    fn resource_name(&self, window: Window) -> Result<Option<String>> {
        Ok(self.names.get(&window).cloned())
    }

    fn icon_window(&self, window: Window) -> Result<Option<Window>> {
        let mut queries = self.icon_queries.borrow_mut();
        let asked = queries.entry(window).or_insert(0);
        *asked += 1;

        Ok(self
            .icons
            .get(&window)
            .and_then(|&(icon, misses)| (*asked > misses).then(|| icon)))
    }

    fn window_size(&self, window: Window) -> Result<Dimension> {
        Ok(self.sizes.get(&window).copied().unwrap_or_default())
    }

    fn set_border_width(&self, window: Window, width: u32) -> Result<()> {
        self.push(Request::BorderWidth(window, width));
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.push(Request::Unmap(window));
        Ok(())
    }

    fn reparent_into_panel(&self, window: Window, at: Point) -> Result<()> {
        self.push(Request::Reparent(window, at));
        Ok(())
    }

    fn map_raised(&self, window: Window) -> Result<()> {
        self.push(Request::MapRaised(window));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.push(Request::Flush);
        Ok(())
    }

    fn watch_creations(&self, enable: bool) -> Result<()> {
        self.push(Request::WatchCreations(enable));
        Ok(())
    }

    fn create_tile_window(&self, at: Point, size: Dimension) -> Result<Window> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.push(Request::CreateTileWindow(id, at, size));
        Ok(id)
    }

    fn draw_image(&self, drawable: Window, image: &Image, at: Point) -> Result<()> {
        self.push(Request::Draw(drawable, image.clone(), at));
        Ok(())
    }
}
