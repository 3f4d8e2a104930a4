//! Connection adapter
//!
//! `XConn` is the narrow set of protocol operations the manager needs.
//! `X11Conn` implements it on top of an x11rb connection; tests drive the
//! manager through a recording fake instead.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::shared::Geometry;
use crate::wm::errors::{ErrorHandler, ErrorLogger, ProtocolError, WmError};

/// Attributes the framing engine reads from a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub geometry: Geometry,
    pub override_redirect: bool,
    pub viewable: bool,
}

/// Protocol operations used by the window manager
pub trait XConn {
    fn root(&self) -> Window;

    /// Screen size, queried once when the connection was opened
    fn screen_size(&self) -> (u32, u32);

    /// Replace the strategy that receives asynchronous protocol errors
    fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>);

    /// Block until the next non-error event arrives
    fn next_event(&self) -> Result<Event>;

    /// Round-trip to the server, delivering any pending errors
    fn sync(&self) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn generate_id(&self) -> Result<Window>;

    fn create_window(
        &self,
        id: Window,
        parent: Window,
        geometry: Geometry,
        background: u32,
        events: EventMask,
    ) -> Result<()>;

    fn destroy_window(&self, window: Window) -> Result<()>;

    fn map_window(&self, window: Window) -> Result<()>;

    fn unmap_window(&self, window: Window) -> Result<()>;

    fn move_window(&self, window: Window, x: i32, y: i32) -> Result<()>;

    fn resize_window(&self, window: Window, width: u32, height: u32) -> Result<()>;

    fn move_resize_window(&self, window: Window, geometry: Geometry) -> Result<()>;

    /// Forward an arbitrary configure, honoring only the fields set in `aux`
    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()>;

    fn raise_window(&self, window: Window) -> Result<()>;

    fn reparent_window(&self, window: Window, parent: Window, x: i32, y: i32) -> Result<()>;

    fn select_input(&self, window: Window, events: EventMask) -> Result<()>;

    fn change_save_set(&self, window: Window, mode: SetMode) -> Result<()>;

    fn set_input_focus(&self, window: Window) -> Result<()>;

    fn input_focus(&self) -> Result<Window>;

    /// `None` when the window no longer exists
    fn window_attributes(&self, window: Window) -> Result<Option<WindowAttributes>>;

    /// Children of the root window, bottom to top
    fn top_level_windows(&self) -> Result<Vec<Window>>;

    /// Add WM_DELETE_WINDOW to the client's WM_PROTOCOLS
    fn enable_delete_protocol(&self, window: Window) -> Result<()>;

    /// Ask a client to close itself
    fn send_delete_window(&self, window: Window) -> Result<()>;

    /// `_NET_WM_NAME`, falling back to `WM_NAME`
    fn window_title(&self, window: Window) -> Result<Option<String>>;

    fn is_title_property(&self, atom: Atom) -> bool;

    /// Set `WM_NAME` on one of our own windows
    fn store_name(&self, window: Window, title: &str) -> Result<()>;

    /// Clear the window and generate Expose so it gets repainted
    fn redraw(&self, window: Window) -> Result<()>;

    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()>;

    /// Keycodes whose unshifted keysym is `keysym`
    fn keycodes_for(&self, keysym: Keysym) -> Result<Vec<Keycode>>;
}

/// Interned atoms
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            wm_protocols: intern("WM_PROTOCOLS")?,
            wm_delete_window: intern("WM_DELETE_WINDOW")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            utf8_string: intern("UTF8_STRING")?,
        })
    }

    /// Title properties in lookup order with the type to request for each.
    /// Legacy `WM_NAME` may be STRING, COMPOUND_TEXT or UTF8_STRING.
    pub fn title_properties(&self) -> [(Atom, Atom); 2] {
        [
            (self.net_wm_name, self.utf8_string),
            (Atom::from(AtomEnum::WM_NAME), Atom::from(AtomEnum::ANY)),
        ]
    }
}

/// `XConn` backed by a real X server
pub struct X11Conn {
    conn: RustConnection,
    root: Window,
    root_depth: u8,
    screen_width: u32,
    screen_height: u32,
    atoms: Atoms,
    error_handler: Box<dyn ErrorHandler>,
    /// Events read while draining errors in `sync`
    pending: RefCell<VecDeque<Event>>,
}

impl X11Conn {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).map_err(WmError::ConnectionUnavailable)?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let root_depth = screen.root_depth;
        let screen_width = u32::from(screen.width_in_pixels);
        let screen_height = u32::from(screen.height_in_pixels);

        info!("Connected to X server, screen {}, root window 0x{:x}", screen_num, root);
        info!("Screen size: {}x{}", screen_width, screen_height);

        let atoms = Atoms::new(&conn).context("Failed to intern atoms")?;

        Ok(Self {
            conn,
            root,
            root_depth,
            screen_width,
            screen_height,
            atoms,
            error_handler: Box::new(ErrorLogger),
            pending: RefCell::new(VecDeque::new()),
        })
    }

    fn report(&self, err: &x11rb::x11_utils::X11Error) {
        self.error_handler.on_error(&ProtocolError::from(err));
    }

    /// Reply of a request about a window that may already be gone
    fn window_reply<R>(&self, window: Window, reply: Result<R, ReplyError>) -> Result<Option<R>> {
        match reply {
            Ok(reply) => Ok(Some(reply)),
            Err(ReplyError::X11Error(err)) => {
                debug!("Window 0x{:x} vanished: {:?}", window, err.error_kind);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl XConn for X11Conn {
    fn root(&self) -> Window {
        self.root
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.error_handler = handler;
    }

    fn next_event(&self) -> Result<Event> {
        if let Some(event) = self.pending.borrow_mut().pop_front() {
            return Ok(event);
        }
        loop {
            match self.conn.wait_for_event()? {
                Event::Error(err) => self.report(&err),
                event => return Ok(event),
            }
        }
    }

    fn sync(&self) -> Result<()> {
        self.conn.sync()?;
        while let Some(event) = self.conn.poll_for_event()? {
            match event {
                Event::Error(err) => self.report(&err),
                event => self.pending.borrow_mut().push_back(event),
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn generate_id(&self) -> Result<Window> {
        Ok(self.conn.generate_id()?)
    }

    fn create_window(
        &self,
        id: Window,
        parent: Window,
        geometry: Geometry,
        background: u32,
        events: EventMask,
    ) -> Result<()> {
        self.conn.create_window(
            self.root_depth,
            id,
            parent,
            geometry.x as i16,
            geometry.y as i16,
            geometry.width.max(1) as u16,
            geometry.height.max(1) as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .background_pixel(background)
                .event_mask(events),
        )?;
        Ok(())
    }

    fn destroy_window(&self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> Result<()> {
        self.configure_window(window, &ConfigureWindowAux::new().x(x).y(y))
    }

    fn resize_window(&self, window: Window, width: u32, height: u32) -> Result<()> {
        self.configure_window(
            window,
            &ConfigureWindowAux::new().width(width.max(1)).height(height.max(1)),
        )
    }

    fn move_resize_window(&self, window: Window, geometry: Geometry) -> Result<()> {
        self.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.width.max(1))
                .height(geometry.height.max(1)),
        )
    }

    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()> {
        self.conn.configure_window(window, aux)?;
        Ok(())
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
    }

    fn reparent_window(&self, window: Window, parent: Window, x: i32, y: i32) -> Result<()> {
        self.conn.reparent_window(window, parent, x as i16, y as i16)?;
        Ok(())
    }

    fn select_input(&self, window: Window, events: EventMask) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(events),
        )?;
        Ok(())
    }

    fn change_save_set(&self, window: Window, mode: SetMode) -> Result<()> {
        self.conn.change_save_set(mode, window)?;
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.conn.set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn input_focus(&self) -> Result<Window> {
        Ok(self.conn.get_input_focus()?.reply()?.focus)
    }

    fn window_attributes(&self, window: Window) -> Result<Option<WindowAttributes>> {
        let attrs = self.conn.get_window_attributes(window)?.reply();
        let Some(attrs) = self.window_reply(window, attrs)? else {
            return Ok(None);
        };
        let geom = self.conn.get_geometry(window)?.reply();
        let Some(geom) = self.window_reply(window, geom)? else {
            return Ok(None);
        };

        Ok(Some(WindowAttributes {
            geometry: Geometry::new(
                i32::from(geom.x),
                i32::from(geom.y),
                u32::from(geom.width),
                u32::from(geom.height),
            ),
            override_redirect: attrs.override_redirect,
            viewable: attrs.map_state == MapState::VIEWABLE,
        }))
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        Ok(self.conn.query_tree(self.root)?.reply()?.children)
    }

    fn enable_delete_protocol(&self, window: Window) -> Result<()> {
        let reply = self
            .conn
            .get_property(false, window, self.atoms.wm_protocols, AtomEnum::ATOM, 0, 32)?
            .reply();
        let Some(reply) = self.window_reply(window, reply)? else {
            return Ok(());
        };

        let mut protocols: Vec<Atom> = reply.value32().map(Iterator::collect).unwrap_or_default();
        if protocols.contains(&self.atoms.wm_delete_window) {
            return Ok(());
        }
        protocols.push(self.atoms.wm_delete_window);

        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.wm_protocols,
            AtomEnum::ATOM,
            &protocols,
        )?;
        Ok(())
    }

    fn send_delete_window(&self, window: Window) -> Result<()> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_: self.atoms.wm_protocols,
            data: ClientMessageData::from([
                self.atoms.wm_delete_window,
                x11rb::CURRENT_TIME,
                0,
                0,
                0,
            ]),
        };
        self.conn.send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn window_title(&self, window: Window) -> Result<Option<String>> {
        for (property, type_) in self.atoms.title_properties() {
            let reply = self.conn.get_property(false, window, property, type_, 0, 1024)?.reply();
            let Some(reply) = self.window_reply(window, reply)? else {
                return Ok(None);
            };
            if !reply.value.is_empty() {
                return Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()));
            }
        }
        Ok(None)
    }

    fn is_title_property(&self, atom: Atom) -> bool {
        atom == self.atoms.net_wm_name || atom == Atom::from(AtomEnum::WM_NAME)
    }

    fn store_name(&self, window: Window, title: &str) -> Result<()> {
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        Ok(())
    }

    fn redraw(&self, window: Window) -> Result<()> {
        self.conn.clear_area(true, window, 0, 0, 0, 0)?;
        Ok(())
    }

    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        self.conn.grab_key(
            true,
            self.root,
            modifiers,
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    fn keycodes_for(&self, keysym: Keysym) -> Result<Vec<Keycode>> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let mapping = self
            .conn
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()
            .context("Failed to read keyboard mapping")?;

        let per_keycode = usize::from(mapping.keysyms_per_keycode);
        if per_keycode == 0 {
            return Ok(Vec::new());
        }
        Ok(mapping
            .keysyms
            .chunks(per_keycode)
            .zip(min..=max)
            .filter(|(syms, _)| syms.first() == Some(&keysym))
            .map(|(_, keycode)| keycode)
            .collect())
    }
}
