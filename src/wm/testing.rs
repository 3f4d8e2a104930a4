//! Recording `XConn` used by the unit tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use anyhow::{Result, bail};
use x11rb::protocol::xproto::*;
use x11rb::protocol::{ErrorKind, Event};

use crate::shared::Geometry;
use crate::wm::conn::{WindowAttributes, XConn};
use crate::wm::errors::{ErrorHandler, ErrorLogger, ProtocolError};
use crate::wm::keyboard::{XK_DOWN, XK_LEFT, XK_RIGHT, XK_UP};

pub const ROOT: Window = 0x100;
pub const NET_WM_NAME: Atom = 300;

/// Keycodes of the arrow keys on a typical evdev keymap
pub const KEY_LEFT: Keycode = 113;
pub const KEY_RIGHT: Keycode = 114;
pub const KEY_UP: Keycode = 111;
pub const KEY_DOWN: Keycode = 116;

/// One request issued through the fake connection
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    CreateWindow { id: Window, parent: Window, geometry: Geometry, events: EventMask },
    DestroyWindow(Window),
    MapWindow(Window),
    UnmapWindow(Window),
    Move { window: Window, x: i32, y: i32 },
    Resize { window: Window, width: u32, height: u32 },
    MoveResize { window: Window, geometry: Geometry },
    Configure {
        window: Window,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
        border_width: Option<u32>,
        sibling: Option<Window>,
        stack_mode: Option<StackMode>,
    },
    Raise(Window),
    Reparent { window: Window, parent: Window, x: i32, y: i32 },
    SelectInput { window: Window, events: EventMask },
    SaveSet { window: Window, mode: SetMode },
    Focus(Window),
    EnableDeleteProtocol(Window),
    DeleteWindow(Window),
    StoreName { window: Window, title: String },
    Redraw(Window),
    GrabKey { keycode: Keycode, modifiers: ModMask },
}

pub struct FakeConn {
    screen: (u32, u32),
    requests: RefCell<Vec<Request>>,
    windows: RefCell<HashMap<Window, WindowAttributes>>,
    titles: RefCell<HashMap<Window, String>>,
    next_id: Cell<Window>,
    focus: Cell<Window>,
    events: RefCell<VecDeque<Event>>,
    competing_wm: bool,
    queued_errors: RefCell<Vec<ProtocolError>>,
    error_handler: Box<dyn ErrorHandler>,
}

impl FakeConn {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: (width, height),
            requests: RefCell::new(Vec::new()),
            windows: RefCell::new(HashMap::new()),
            titles: RefCell::new(HashMap::new()),
            next_id: Cell::new(0x1000),
            focus: Cell::new(ROOT),
            events: RefCell::new(VecDeque::new()),
            competing_wm: false,
            queued_errors: RefCell::new(Vec::new()),
            error_handler: Box::new(ErrorLogger),
        }
    }

    /// A server where another client already holds SubstructureRedirect
    pub fn with_competing_wm(mut self) -> Self {
        self.competing_wm = true;
        self
    }

    /// Register an unmanaged client window
    pub fn add_window(&self, id: Window, geometry: Geometry) {
        self.windows.borrow_mut().insert(
            id,
            WindowAttributes {
                geometry,
                override_redirect: false,
                viewable: false,
            },
        );
    }

    pub fn set_attributes(&self, id: Window, attrs: WindowAttributes) {
        self.windows.borrow_mut().insert(id, attrs);
    }

    pub fn set_title(&self, id: Window, title: &str) {
        self.titles.borrow_mut().insert(id, title.to_string());
    }

    pub fn push_event(&self, event: Event) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&Request) -> bool) -> usize {
        self.requests.borrow().iter().filter(|r| pred(r)).count()
    }

    pub fn focused(&self) -> Window {
        self.focus.get()
    }

    fn record(&self, request: Request) {
        self.requests.borrow_mut().push(request);
    }
}

impl XConn for FakeConn {
    fn root(&self) -> Window {
        ROOT
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.error_handler = handler;
    }

    fn next_event(&self) -> Result<Event> {
        match self.events.borrow_mut().pop_front() {
            Some(event) => Ok(event),
            None => bail!("connection closed"),
        }
    }

    fn sync(&self) -> Result<()> {
        for err in self.queued_errors.borrow_mut().drain(..) {
            self.error_handler.on_error(&err);
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn generate_id(&self) -> Result<Window> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(id)
    }

    fn create_window(
        &self,
        id: Window,
        parent: Window,
        geometry: Geometry,
        _background: u32,
        events: EventMask,
    ) -> Result<()> {
        self.record(Request::CreateWindow { id, parent, geometry, events });
        Ok(())
    }

    fn destroy_window(&self, window: Window) -> Result<()> {
        self.record(Request::DestroyWindow(window));
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.record(Request::MapWindow(window));
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.record(Request::UnmapWindow(window));
        Ok(())
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> Result<()> {
        self.record(Request::Move { window, x, y });
        Ok(())
    }

    fn resize_window(&self, window: Window, width: u32, height: u32) -> Result<()> {
        self.record(Request::Resize { window, width, height });
        Ok(())
    }

    fn move_resize_window(&self, window: Window, geometry: Geometry) -> Result<()> {
        self.record(Request::MoveResize { window, geometry });
        Ok(())
    }

    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()> {
        self.record(Request::Configure {
            window,
            x: aux.x,
            y: aux.y,
            width: aux.width,
            height: aux.height,
            border_width: aux.border_width,
            sibling: aux.sibling,
            stack_mode: aux.stack_mode,
        });
        Ok(())
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.record(Request::Raise(window));
        Ok(())
    }

    fn reparent_window(&self, window: Window, parent: Window, x: i32, y: i32) -> Result<()> {
        self.record(Request::Reparent { window, parent, x, y });
        Ok(())
    }

    fn select_input(&self, window: Window, events: EventMask) -> Result<()> {
        self.record(Request::SelectInput { window, events });
        let redirect = u32::from(EventMask::SUBSTRUCTURE_REDIRECT);
        if window == ROOT && self.competing_wm && u32::from(events) & redirect != 0 {
            self.queued_errors.borrow_mut().push(ProtocolError {
                kind: ErrorKind::Access,
                bad_value: ROOT,
                request: Some("ChangeWindowAttributes"),
            });
        }
        Ok(())
    }

    fn change_save_set(&self, window: Window, mode: SetMode) -> Result<()> {
        self.record(Request::SaveSet { window, mode });
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.record(Request::Focus(window));
        self.focus.set(window);
        Ok(())
    }

    fn input_focus(&self) -> Result<Window> {
        Ok(self.focus.get())
    }

    fn window_attributes(&self, window: Window) -> Result<Option<WindowAttributes>> {
        Ok(self.windows.borrow().get(&window).copied())
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        let mut windows: Vec<Window> = self.windows.borrow().keys().copied().collect();
        windows.sort_unstable();
        Ok(windows)
    }

    fn enable_delete_protocol(&self, window: Window) -> Result<()> {
        self.record(Request::EnableDeleteProtocol(window));
        Ok(())
    }

    fn send_delete_window(&self, window: Window) -> Result<()> {
        self.record(Request::DeleteWindow(window));
        Ok(())
    }

    fn window_title(&self, window: Window) -> Result<Option<String>> {
        Ok(self.titles.borrow().get(&window).cloned())
    }

    fn is_title_property(&self, atom: Atom) -> bool {
        atom == NET_WM_NAME || atom == Atom::from(AtomEnum::WM_NAME)
    }

    fn store_name(&self, window: Window, title: &str) -> Result<()> {
        self.record(Request::StoreName { window, title: title.to_string() });
        Ok(())
    }

    fn redraw(&self, window: Window) -> Result<()> {
        self.record(Request::Redraw(window));
        Ok(())
    }

    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        self.record(Request::GrabKey { keycode, modifiers });
        Ok(())
    }

    fn keycodes_for(&self, keysym: Keysym) -> Result<Vec<Keycode>> {
        Ok(match keysym {
            XK_LEFT => vec![KEY_LEFT],
            XK_RIGHT => vec![KEY_RIGHT],
            XK_UP => vec![KEY_UP],
            XK_DOWN => vec![KEY_DOWN],
            _ => Vec::new(),
        })
    }
}

pub fn map_request(window: Window) -> Event {
    Event::MapRequest(MapRequestEvent {
        response_type: MAP_REQUEST_EVENT,
        sequence: 0,
        parent: ROOT,
        window,
    })
}

/// UnmapNotify as reported to `event`'s SubstructureNotify selection
pub fn unmap_notify(event: Window, window: Window) -> Event {
    Event::UnmapNotify(UnmapNotifyEvent {
        response_type: UNMAP_NOTIFY_EVENT,
        sequence: 0,
        event,
        window,
        from_configure: false,
    })
}

pub fn destroy_notify(window: Window) -> Event {
    Event::DestroyNotify(DestroyNotifyEvent {
        response_type: DESTROY_NOTIFY_EVENT,
        sequence: 0,
        event: ROOT,
        window,
    })
}

pub fn configure_request(window: Window, mask: ConfigWindow, geometry: Geometry) -> Event {
    Event::ConfigureRequest(ConfigureRequestEvent {
        response_type: CONFIGURE_REQUEST_EVENT,
        stack_mode: StackMode::ABOVE,
        sequence: 0,
        parent: ROOT,
        window,
        sibling: x11rb::NONE,
        x: geometry.x as i16,
        y: geometry.y as i16,
        width: geometry.width as u16,
        height: geometry.height as u16,
        border_width: 0,
        value_mask: mask,
    })
}

pub fn property_notify(window: Window, atom: Atom) -> Event {
    Event::PropertyNotify(PropertyNotifyEvent {
        response_type: PROPERTY_NOTIFY_EVENT,
        sequence: 0,
        window,
        atom,
        time: 0,
        state: Property::NEW_VALUE,
    })
}

pub fn button_press(window: Window, button: u8, root_x: i16, root_y: i16) -> Event {
    Event::ButtonPress(ButtonPressEvent {
        response_type: BUTTON_PRESS_EVENT,
        detail: button,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: window,
        child: x11rb::NONE,
        root_x,
        root_y,
        event_x: 0,
        event_y: 0,
        state: KeyButMask::from(0u16),
        same_screen: true,
    })
}

pub fn button_release(window: Window, button: u8, root_x: i16, root_y: i16) -> Event {
    Event::ButtonRelease(ButtonReleaseEvent {
        response_type: BUTTON_RELEASE_EVENT,
        detail: button,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: window,
        child: x11rb::NONE,
        root_x,
        root_y,
        event_x: 0,
        event_y: 0,
        state: KeyButMask::BUTTON1,
        same_screen: true,
    })
}

pub fn motion(window: Window, root_x: i16, root_y: i16) -> Event {
    Event::MotionNotify(MotionNotifyEvent {
        response_type: MOTION_NOTIFY_EVENT,
        detail: Motion::NORMAL,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: window,
        child: x11rb::NONE,
        root_x,
        root_y,
        event_x: 0,
        event_y: 0,
        state: KeyButMask::BUTTON1,
        same_screen: true,
    })
}

pub fn key_press(keycode: Keycode, state: KeyButMask) -> Event {
    Event::KeyPress(KeyPressEvent {
        response_type: KEY_PRESS_EVENT,
        detail: keycode,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: ROOT,
        child: x11rb::NONE,
        root_x: 0,
        root_y: 0,
        event_x: 0,
        event_y: 0,
        state,
        same_screen: true,
    })
}
