//! The connection to the X-Server

use super::{
    event::XEvent,
    property::{icon_window_from_hints, instance_from_class, MotifHints, WM_HINTS_LEN},
    utils::XUtility,
    Backend,
};
use crate::{
    config::PanelSettings,
    core::{wm_class_value, Window, ALL_DESKTOPS, PANEL_CLASS, PANEL_INSTANCE, PANEL_TITLE},
    geometry::{Dimension, Point},
    render::Image,
};
use anyhow::{anyhow, Context, Result};
use std::os::unix::io::{AsRawFd, RawFd};
use x11rb::{
    atom_manager,
    connection::{Connection, RequestConnection},
    cursor::Handle as CursorHandle,
    errors::ReplyError,
    protocol::xproto::{
        AtomEnum,
        ChangeWindowAttributesAux,
        ConfigureWindowAux,
        ConnectionExt,
        CreateGCAux,
        CreateWindowAux,
        Cursor,
        EventMask,
        Gcontext,
        ImageFormat,
        ImageOrder,
        PropMode,
        StackMode,
        WindowClass,
    },
    resource_manager::Database,
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    COPY_DEPTH_FROM_PARENT,
    COPY_FROM_PARENT,
};

/// Size of a `PutImage` request without its data
const PUT_IMAGE_HEADER: usize = 24;

// === Atoms === [[[

// The atoms the panel reads or writes that have no predefined value. See the
// Extended Window Manager Hints:
// https://specifications.freedesktop.org/wm-spec/wm-spec-latest.html
atom_manager! {
    pub(crate) Atoms: AtomsCookie {
        // Set on root window to be the ID of a child window to indicate WM is active
        _NET_SUPPORTING_WM_CHECK,
        // Desktop a window is on; 0xFFFFFFFF means all of them
        _NET_WM_DESKTOP,
        // List of states of a window
        _NET_WM_STATE,
        // Window is kept above all others
        _NET_WM_STATE_ABOVE,
        // Legacy decoration and function hints
        _MOTIF_WM_HINTS,
    }
}

// ]]] === Atoms ===

// ============================ XConnection =========================== [[[

/// The main connection to the X-Server
pub(crate) struct XConnection {
    /// Connection to the X-Server
    conn:            RustConnection,
    /// Interned atoms
    atoms:           Atoms,
    /// The root window
    root:            Window,
    /// Depth of the root window
    depth:           u8,
    /// Byte order of image data
    image_order:     ImageOrder,
    /// Pixel value for white on this screen
    white_pixel:     u32,
    /// Pixel value for black on this screen
    black_pixel:     u32,
    /// The panel's top-level window
    panel:           Window,
    /// Graphics context used to put images
    gctx:            Gcontext,
    /// Cursor shown above launchers
    launcher_cursor: Option<Cursor>,
}

impl XConnection {
    /// Create a new [`XConnection`], creating and showing the panel window for
    /// `tile_count` tiles
    pub(crate) fn new(
        conn: RustConnection,
        screen_num: usize,
        settings: &PanelSettings,
        tile_count: usize,
    ) -> Result<Self> {
        log::trace!("creating a new `XConnection`");

        let setup = conn.setup();
        let screen = setup
            .roots
            .get(screen_num)
            .ok_or_else(|| anyhow!("screen {} does not exist", screen_num))?;
        let image_order = XUtility::pixel_layout(setup, screen)?;
        let (root, depth) = (screen.root, screen.root_depth);
        let (white_pixel, black_pixel) = (screen.white_pixel, screen.black_pixel);

        log::debug!("interning Atoms");
        let atoms = Atoms::new(&conn)
            .context("failed to get `Atoms`")?
            .reply()
            .context("failed to get `Atoms` reply")?;

        let panel = conn.generate_id().context("failed to generate an `ID`")?;
        let gctx = conn.generate_id().context("failed to generate an `ID`")?;
        let launcher_cursor = Self::load_cursor(&conn, screen_num, "hand2");

        let xconn = Self {
            conn,
            atoms,
            root,
            depth,
            image_order,
            white_pixel,
            black_pixel,
            panel,
            gctx,
            launcher_cursor,
        };

        xconn.watch_creations(true)?;
        xconn.init_panel(settings, settings.layout.panel(tile_count))?;

        Ok(xconn)
    }

    // ========================= Accessor ========================= [[[

    /// Return the connection to the X-Server
    pub(crate) const fn aux(&self) -> &RustConnection {
        &self.conn
    }

    /// Return the `root` window
    pub(crate) const fn root(&self) -> Window {
        self.root
    }

    // ]]] === Accessor ===

    // ======================== Initialize ======================== [[[

    /// Create, decorate and map the panel window
    fn init_panel(&self, settings: &PanelSettings, size: Dimension) -> Result<()> {
        let (x, y) = settings.origin.as_tuple();
        log::debug!(
            "creating panel Window({:#0x}) {} at {}",
            self.panel,
            size,
            settings.origin
        );

        self.aux()
            .create_window(
                COPY_DEPTH_FROM_PARENT,    // depth
                self.panel,                // wid
                self.root(),               // parent
                x as i16,                  // x
                y as i16,                  // y
                size.width as u16,         // width
                size.height as u16,        // height
                0,                         // border_width
                WindowClass::INPUT_OUTPUT, // class
                COPY_FROM_PARENT,          // visual
                &CreateWindowAux::new()
                    .background_pixel(self.white_pixel)
                    .border_pixel(self.black_pixel),
            )
            .context("failed to create panel window")?
            .check()
            .context("failed to check creating panel window")?;

        self.aux()
            .create_gc(self.gctx, self.panel, &CreateGCAux::new())
            .context("failed to create graphics context")?
            .check()
            .context("failed to check creating graphics context")?;

        self.set_panel_hints(settings)?;

        self.aux().map_window(self.panel)?;
        // Window managers may have placed it elsewhere
        self.aux().configure_window(
            self.panel,
            &ConfigureWindowAux::new()
                .x(x)
                .y(y)
                .width(size.width)
                .height(size.height),
        )?;
        self.aux().change_window_attributes(
            self.panel,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::EXPOSURE | EventMask::STRUCTURE_NOTIFY),
        )?;

        self.flush()
    }

    /// Title, class, Motif hints and the optional EWMH hints of the panel
    fn set_panel_hints(&self, settings: &PanelSettings) -> Result<()> {
        log::debug!("setting hints for panel Window({:#0x})", self.panel);

        self.aux().change_property8(
            PropMode::REPLACE,
            self.panel,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            PANEL_TITLE.as_bytes(),
        )?;
        self.aux().change_property8(
            PropMode::REPLACE,
            self.panel,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            &wm_class_value(PANEL_INSTANCE, PANEL_CLASS),
        )?;
        self.set_motif_hints(settings.motif)?;

        if settings.above {
            self.aux().change_property32(
                PropMode::REPLACE,
                self.panel,
                self.atoms._NET_WM_STATE,
                AtomEnum::ATOM,
                &[self.atoms._NET_WM_STATE_ABOVE],
            )?;
        }

        if settings.all_desktops {
            self.aux().change_property32(
                PropMode::REPLACE,
                self.panel,
                self.atoms._NET_WM_DESKTOP,
                AtomEnum::CARDINAL,
                &[ALL_DESKTOPS],
            )?;
        }

        Ok(())
    }

    /// Set `_MOTIF_WM_HINTS` on the panel
    fn set_motif_hints(&self, hints: MotifHints) -> Result<()> {
        log::trace!("setting {:?} on panel", hints);
        self.aux().change_property32(
            PropMode::REPLACE,
            self.panel,
            self.atoms._MOTIF_WM_HINTS,
            self.atoms._MOTIF_WM_HINTS,
            &hints.to_property(),
        )?;

        Ok(())
    }

    /// Load a cursor from the cursor theme. Failure only loses the cursor
    fn load_cursor(conn: &RustConnection, screen_num: usize, name: &str) -> Option<Cursor> {
        log::debug!("loading the `{}` cursor", name);
        let db = Database::new_from_default(conn).ok()?;
        let handle = CursorHandle::new(conn, screen_num, &db).ok()?.reply().ok()?;
        handle.load_cursor(conn, name).ok()
    }

    // ]]] === Initialize ===

    // ======================= Base Wrappers ====================== [[[

    /// File descriptor of the connection, readable when events arrive
    pub(crate) fn fd(&self) -> RawFd {
        self.aux().stream().as_raw_fd()
    }

    /// Shorter `poll_for_event` (non-blocking)
    pub(crate) fn poll_for_event(&self) -> Result<Option<XEvent>> {
        Ok(self
            .aux()
            .poll_for_event()
            .context("failed to poll for next event")?
            .map(XEvent::from))
    }

    /// Wait for a reply, turning an X11 error into `None`. Errors of the
    /// connection itself are returned
    fn reply_or_none<R>(reply: Result<R, ReplyError>) -> Result<Option<R>> {
        match reply {
            Ok(reply) => Ok(Some(reply)),
            Err(ReplyError::X11Error(e)) => {
                log::trace!("request failed: {:?}", e.error_kind);
                Ok(None)
            },
            Err(ReplyError::ConnectionError(e)) => Err(e.into()),
        }
    }

    /// Read a property of `window` of any type, `None` if it does not exist
    fn get_property(&self, window: Window, property: AtomEnum, length: u32) -> Result<Option<Vec<u8>>> {
        let reply = self
            .aux()
            .get_property(false, window, property, AtomEnum::ANY, 0, length)
            .context("failed to get property")?
            .reply();

        Ok(Self::reply_or_none(reply)?
            .filter(|r| r.type_ != x11rb::NONE)
            .map(|r| r.value))
    }

    // ]]] === Base Wrappers ===
}

// ]]] === XConnection ===

// ============================== Backend ============================= [[[

impl Backend for XConnection {
    fn panel(&self) -> Window {
        self.panel
    }

    fn window_manager_running(&self) -> Result<bool> {
        log::debug!("checking if a window manager is running");
        let reply = self
            .aux()
            .get_property(
                false,
                self.root(),
                self.atoms._NET_SUPPORTING_WM_CHECK,
                AtomEnum::ANY,
                0,
                1,
            )
            .context("failed to get `_NET_SUPPORTING_WM_CHECK`")?
            .reply();

        Ok(Self::reply_or_none(reply)?.map_or(false, |r| r.type_ != x11rb::NONE))
    }

    fn resource_name(&self, window: Window) -> Result<Option<String>> {
        log::trace!("getting `WM_CLASS` for Window({:#0x})", window);
        Ok(self
            .get_property(window, AtomEnum::WM_CLASS, 256)?
            .and_then(|value| instance_from_class(&value)))
    }

    fn icon_window(&self, window: Window) -> Result<Option<Window>> {
        log::trace!("getting `WM_HINTS` for Window({:#0x})", window);
        let reply = self
            .aux()
            .get_property(
                false,
                window,
                AtomEnum::WM_HINTS,
                AtomEnum::ANY,
                0,
                WM_HINTS_LEN as u32,
            )
            .context("failed to get `WM_HINTS`")?
            .reply();

        Ok(Self::reply_or_none(reply)?.and_then(|r| {
            r.value32()
                .and_then(|values| icon_window_from_hints(&values.collect::<Vec<_>>()))
        }))
    }

    fn window_size(&self, window: Window) -> Result<Dimension> {
        let reply = self
            .aux()
            .get_geometry(window)
            .context("failed to get `GetGeometryReply`")?
            .reply();

        Ok(Self::reply_or_none(reply)?.map_or_else(Dimension::default, |geom| {
            Dimension::new(u32::from(geom.width), u32::from(geom.height))
        }))
    }

    fn set_border_width(&self, window: Window, width: u32) -> Result<()> {
        log::trace!("setting Window({:#0x}) border width {}", window, width);
        self.aux()
            .configure_window(window, &ConfigureWindowAux::new().border_width(width))?;
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        log::trace!("unmapping Window({:#0x})", window);
        self.aux().unmap_window(window)?;
        Ok(())
    }

    fn reparent_into_panel(&self, window: Window, at: Point) -> Result<()> {
        log::trace!("reparenting Window({:#0x}) to {}", window, at);
        self.aux()
            .reparent_window(window, self.panel, at.x as i16, at.y as i16)?;
        Ok(())
    }

    fn map_raised(&self, window: Window) -> Result<()> {
        log::trace!("mapping Window({:#0x}) raised", window);
        self.aux().configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        self.aux().map_window(window)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.aux()
            .flush()
            .context("failed to flush actions to X-server")
    }

    fn watch_creations(&self, enable: bool) -> Result<()> {
        log::debug!("watching for new windows: {}", enable);
        let mask = if enable {
            EventMask::SUBSTRUCTURE_NOTIFY
        } else {
            EventMask::NO_EVENT
        };

        self.aux()
            .change_window_attributes(self.root(), &ChangeWindowAttributesAux::new().event_mask(mask))
            .context("failed to select root window events")?
            .check()
            .context("failed to check selecting root window events")?;

        Ok(())
    }

    fn create_tile_window(&self, at: Point, size: Dimension) -> Result<Window> {
        let window = self.aux().generate_id().context("failed to generate an `ID`")?;

        self.aux()
            .create_window(
                COPY_DEPTH_FROM_PARENT,
                window,
                self.panel,
                at.x as i16,
                at.y as i16,
                size.width as u16,
                size.height as u16,
                0,
                WindowClass::INPUT_OUTPUT,
                COPY_FROM_PARENT,
                &CreateWindowAux::new()
                    .background_pixel(self.white_pixel)
                    .border_pixel(self.black_pixel)
                    .event_mask(EventMask::EXPOSURE | EventMask::BUTTON_PRESS)
                    .cursor(self.launcher_cursor),
            )
            .context(format!("failed to create tile Window({:#0x})", window))?;
        self.aux().map_window(window)?;

        Ok(window)
    }

    fn draw_image(&self, drawable: Window, image: &Image, at: Point) -> Result<()> {
        // Room left for pixel data once the `PutImage` header is accounted for
        let max_bytes = self
            .aux()
            .maximum_request_bytes()
            .saturating_sub(PUT_IMAGE_HEADER);

        for (top, strip) in image.strips(max_bytes) {
            let size = strip.dimension();
            self.aux()
                .put_image(
                    ImageFormat::Z_PIXMAP,
                    drawable,
                    self.gctx,
                    size.width as u16,
                    size.height as u16,
                    at.x as i16,
                    (at.y + top as i32) as i16,
                    0,
                    self.depth,
                    &strip.to_zpixmap(self.image_order),
                )
                .context(format!("failed to put image on Window({:#0x})", drawable))?;
        }

        Ok(())
    }
}

// ]]] === Backend ===

// vim: ft=rust:et:sw=4:ts=2:sts=4:tw=99:fdm=marker:fmr=[[[,]]]:
