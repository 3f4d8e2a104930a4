//! Window Manager Module
//!
//! Handles X11 window management, decorations, and user interactions.

pub mod client;
pub mod conn;
pub mod decorations;
pub mod errors;
pub mod events;
pub mod guard;
pub mod keyboard;
pub mod moveresize;
pub mod placement;
pub mod registry;

#[cfg(test)]
pub mod testing;

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::protocol::xproto::Window;

use crate::config::Config;
use crate::wm::client::Client;
use crate::wm::conn::XConn;
use crate::wm::decorations::{DecorationLayout, WindowFrame};
use crate::wm::keyboard::KeyboardManager;
use crate::wm::moveresize::MoveResizeManager;
use crate::wm::registry::ClientRegistry;

pub struct WindowManager<C: XConn> {
    conn: C,
    config: Config,
    clients: ClientRegistry,
    moveresize: MoveResizeManager,
    keys: KeyboardManager,
}

impl<C: XConn> WindowManager<C> {
    /// Create a new window manager. Nothing is sent to the server until
    /// `start` or `run`.
    pub fn new(conn: C, config: Config) -> Self {
        Self {
            conn,
            config,
            clients: ClientRegistry::new(),
            moveresize: MoveResizeManager::new(),
            keys: KeyboardManager::default(),
        }
    }

    /// Claim the display, grab shortcuts and decorate windows that were
    /// mapped before we started
    pub fn start(&mut self) -> Result<()> {
        info!("Initializing window manager");
        guard::become_wm(&mut self.conn)?;
        self.keys = KeyboardManager::grab(&self.conn, &self.config.keybindings)?;
        self.adopt_existing()?;
        self.conn.flush()?;
        Ok(())
    }

    /// Start, then dispatch events until the connection breaks
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        info!("Entering event loop");
        loop {
            let event = self.conn.next_event().context("Lost connection to X server")?;
            self.handle_event(event)?;
            self.conn.flush()?;
        }
    }

    fn adopt_existing(&mut self) -> Result<()> {
        for window in self.conn.top_level_windows()? {
            let Some(attrs) = self.conn.window_attributes(window)? else {
                continue;
            };
            if attrs.viewable && !attrs.override_redirect {
                debug!("Adopting existing window 0x{:x}", window);
                self.frame_window(window)?;
            }
        }
        info!("Adopted {} existing windows", self.clients.len());
        Ok(())
    }

    /// Wrap `window` in a decorated frame and start managing it
    pub fn frame_window(&mut self, window: Window) -> Result<()> {
        if self.clients.contains(window) {
            return Ok(());
        }

        let Some(attrs) = self.conn.window_attributes(window)? else {
            debug!("Window 0x{:x} disappeared before it could be framed", window);
            return Ok(());
        };
        if attrs.override_redirect {
            debug!("Window 0x{:x} is override-redirect, skipping", window);
            return Ok(());
        }

        self.conn.enable_delete_protocol(window)?;

        let deco = &self.config.decorations;
        let title = self
            .conn
            .window_title(window)?
            .unwrap_or_else(|| self.config.window_manager.default_title.clone());
        let geometry = DecorationLayout::frame_for_client(attrs.geometry, deco);

        let frame = WindowFrame::new(&self.conn, window, geometry, deco)
            .with_context(|| format!("Failed to frame window 0x{:x}", window))?;
        self.conn.store_name(frame.frame, &title)?;
        frame.map(&self.conn)?;
        frame.raise(&self.conn)?;
        self.conn.set_input_focus(window)?;

        info!("Framed window 0x{:x} ({:?}) in 0x{:x} at {:?}", window, title, frame.frame, geometry);
        self.clients.insert(Client::new(frame, geometry, title))
    }

    /// Give `window` back to the root and forget it
    pub fn unframe_window(&mut self, window: Window) -> Result<()> {
        let Some(client) = self.clients.remove(window) else {
            return Ok(());
        };
        client.frame.destroy(&self.conn)?;
        info!("Unframed window 0x{:x}", window);
        Ok(())
    }
}
