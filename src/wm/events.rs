//! Events Module
//!
//! Routes every X11 event to exactly one handler.

use anyhow::Result;
use tracing::{debug, trace};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;

use crate::wm::WindowManager;
use crate::wm::conn::XConn;

fn has(mask: ConfigWindow, flag: ConfigWindow) -> bool {
    u16::from(mask) & u16::from(flag) != 0
}

impl<C: XConn> WindowManager<C> {
    /// Route an event to the appropriate handler
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::CreateNotify(e) => {
                debug!("CreateNotify: window 0x{:x}", e.window);
                Ok(())
            }
            Event::DestroyNotify(e) => {
                debug!("DestroyNotify: window 0x{:x}", e.window);
                Ok(())
            }
            Event::ReparentNotify(e) => {
                debug!("ReparentNotify: window 0x{:x} -> 0x{:x}", e.window, e.parent);
                Ok(())
            }
            Event::MapNotify(e) => {
                debug!("MapNotify: window 0x{:x}", e.window);
                Ok(())
            }
            Event::ConfigureNotify(e) => {
                trace!("ConfigureNotify: window 0x{:x}", e.window);
                Ok(())
            }
            Event::ConfigureRequest(e) => self.on_configure_request(&e),
            Event::MapRequest(e) => self.on_map_request(&e),
            Event::UnmapNotify(e) => self.on_unmap_notify(&e),
            Event::PropertyNotify(e) => self.on_property_notify(&e),
            Event::ButtonPress(e) => self.moveresize.handle_button_press(
                &self.conn,
                &mut self.clients,
                &self.config,
                &e,
            ),
            Event::ButtonRelease(e) => self.moveresize.handle_button_release(
                &self.conn,
                &mut self.clients,
                &self.config,
                &e,
            ),
            Event::MotionNotify(e) => self.moveresize.handle_motion(
                &self.conn,
                &mut self.clients,
                &self.config,
                &e,
            ),
            Event::KeyPress(e) => match self.keys.action_for(&e) {
                Some(action) => {
                    debug!("KeyPress: keycode {} -> {:?}", e.detail, action);
                    self.moveresize
                        .handle_key_action(&self.conn, &mut self.clients, &self.config, action)
                }
                None => Ok(()),
            },
            other => {
                trace!("Ignoring event {:?}", other);
                Ok(())
            }
        }
    }

    fn on_configure_request(&mut self, e: &ConfigureRequestEvent) -> Result<()> {
        let mask = e.value_mask;
        let Some(client) = self.clients.get_mut(e.window) else {
            debug!("ConfigureRequest: passing through for unmanaged 0x{:x}", e.window);
            return self
                .conn
                .configure_window(e.window, &ConfigureWindowAux::from_configure_request(e));
        };

        let deco = &self.config.decorations;
        let mut geometry = client.geometry;
        let mut frame_aux = ConfigureWindowAux::new();

        if has(mask, ConfigWindow::X) {
            geometry.x = i32::from(e.x);
            frame_aux = frame_aux.x(geometry.x);
        }
        if has(mask, ConfigWindow::Y) {
            geometry.y = i32::from(e.y);
            frame_aux = frame_aux.y(geometry.y);
        }
        let resized = has(mask, ConfigWindow::WIDTH) || has(mask, ConfigWindow::HEIGHT);
        if has(mask, ConfigWindow::WIDTH) {
            geometry.width = u32::from(e.width) + deco.horizontal_inset();
            frame_aux = frame_aux.width(geometry.width);
        }
        if has(mask, ConfigWindow::HEIGHT) {
            geometry.height = u32::from(e.height) + deco.vertical_inset();
            frame_aux = frame_aux.height(geometry.height);
        }
        if has(mask, ConfigWindow::SIBLING) {
            frame_aux = frame_aux.sibling(e.sibling);
        }
        if has(mask, ConfigWindow::STACK_MODE) {
            frame_aux = frame_aux.stack_mode(e.stack_mode);
        }

        let frame_fields = ConfigWindow::X
            | ConfigWindow::Y
            | ConfigWindow::WIDTH
            | ConfigWindow::HEIGHT
            | ConfigWindow::SIBLING
            | ConfigWindow::STACK_MODE;

        let placed = ConfigWindow::X | ConfigWindow::Y | ConfigWindow::WIDTH | ConfigWindow::HEIGHT;
        if has(mask, placed) && client.is_snapped() {
            debug!("ConfigureRequest: 0x{:x} leaves {:?}", e.window, client.snap_state);
            client.clear_snap();
        }

        debug!("ConfigureRequest: 0x{:x} frame -> {:?}", e.window, geometry);
        if has(mask, frame_fields) {
            self.conn.configure_window(client.frame.frame, &frame_aux)?;
        }
        if resized {
            client.frame.relayout(&self.conn, geometry.width, geometry.height, deco)?;
        }
        if has(mask, ConfigWindow::BORDER_WIDTH) {
            self.conn.configure_window(
                e.window,
                &ConfigureWindowAux::new().border_width(u32::from(e.border_width)),
            )?;
        }
        client.geometry = geometry;
        Ok(())
    }

    fn on_map_request(&mut self, e: &MapRequestEvent) -> Result<()> {
        debug!("MapRequest: window 0x{:x}", e.window);
        if self.clients.contains(e.window) {
            return self.conn.map_window(e.window);
        }
        self.frame_window(e.window)
    }

    fn on_unmap_notify(&mut self, e: &UnmapNotifyEvent) -> Result<()> {
        // Reparenting an already viewable window during adoption makes the
        // server unmap it; that copy is reported relative to the root.
        if e.event == self.conn.root() {
            trace!("UnmapNotify: ignoring 0x{:x} reported on root", e.window);
            return Ok(());
        }
        if !self.clients.contains(e.window) {
            trace!("UnmapNotify: 0x{:x} is not managed", e.window);
            return Ok(());
        }
        debug!("UnmapNotify: window 0x{:x}", e.window);
        self.unframe_window(e.window)
    }

    fn on_property_notify(&mut self, e: &PropertyNotifyEvent) -> Result<()> {
        if !self.conn.is_title_property(e.atom) {
            return Ok(());
        }
        let Some(client) = self.clients.get_mut(e.window) else {
            return Ok(());
        };

        let title = self
            .conn
            .window_title(e.window)?
            .unwrap_or_else(|| self.config.window_manager.default_title.clone());
        if title == client.title {
            return Ok(());
        }
        debug!("Title of 0x{:x} changed to {:?}", e.window, title);
        client.set_title(&self.conn, title)
    }
}
