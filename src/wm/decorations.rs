//! Window decorations (titlebar, buttons, resize handle) for sevenwm

use anyhow::Result;
use x11rb::protocol::xproto::{EventMask, SetMode, Window};

use crate::config::DecorationConfig;
use crate::shared::Geometry;
use crate::wm::conn::XConn;

/// Which part of a frame a window id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePart {
    Frame,
    TitleBar,
    Close,
    Zoom,
    ResizeHandle,
}

/// Frame-relative rectangles of everything inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorationLayout {
    pub titlebar: Geometry,
    pub close: Geometry,
    pub zoom: Geometry,
    pub resize_handle: Geometry,
    pub client: Geometry,
}

impl DecorationLayout {
    /// Layout for a frame of `width`×`height`
    pub fn new(width: u32, height: u32, deco: &DecorationConfig) -> Self {
        let b = deco.border_width as i32;
        let th = deco.titlebar_height;
        let bs = deco.button_size;
        let hs = deco.resize_handle_size;
        let inner_width = width.saturating_sub(deco.horizontal_inset()).max(1);
        let inner_height = height.saturating_sub(deco.vertical_inset()).max(1);
        let button_y = b + ((th - bs) / 2) as i32;

        Self {
            titlebar: Geometry::new(b, b, inner_width, th),
            close: Geometry::new(b + deco.button_margin as i32, button_y, bs, bs),
            zoom: Geometry::new(
                width as i32 - b - (deco.button_margin + bs) as i32,
                button_y,
                bs,
                bs,
            ),
            resize_handle: Geometry::new(
                width as i32 - b - hs as i32,
                height as i32 - b - hs as i32,
                hs,
                hs,
            ),
            client: Geometry::new(b, b + th as i32, inner_width, inner_height),
        }
    }

    /// Frame rectangle enclosing a client at `client` (root coordinates)
    pub fn frame_for_client(client: Geometry, deco: &DecorationConfig) -> Geometry {
        client.with_size(
            client.width + deco.horizontal_inset(),
            client.height + deco.vertical_inset(),
        )
    }
}

/// Represents a window frame with decorations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFrame {
    pub client: Window,
    pub frame: Window,
    pub titlebar: Window,
    pub close_button: Window,
    pub zoom_button: Window,
    pub resize_handle: Window,
}

impl WindowFrame {
    /// Create the frame and its decorations around `client` and reparent the
    /// client into it. `geometry` is the frame rectangle in root coordinates.
    /// Nothing is mapped yet.
    pub fn new<C: XConn>(
        conn: &C,
        client: Window,
        geometry: Geometry,
        deco: &DecorationConfig,
    ) -> Result<Self> {
        let frame = conn.generate_id()?;
        let titlebar = conn.generate_id()?;
        let close_button = conn.generate_id()?;
        let zoom_button = conn.generate_id()?;
        let resize_handle = conn.generate_id()?;

        let layout = DecorationLayout::new(geometry.width, geometry.height, deco);
        let draggable = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION;

        conn.create_window(
            frame,
            conn.root(),
            geometry,
            deco.frame_color,
            EventMask::SUBSTRUCTURE_REDIRECT
                | EventMask::SUBSTRUCTURE_NOTIFY
                | EventMask::BUTTON_PRESS,
        )?;
        conn.create_window(titlebar, frame, layout.titlebar, deco.titlebar_color, draggable)?;
        conn.create_window(
            close_button,
            frame,
            layout.close,
            deco.button_color,
            EventMask::BUTTON_PRESS,
        )?;
        conn.create_window(
            zoom_button,
            frame,
            layout.zoom,
            deco.button_color,
            EventMask::BUTTON_PRESS,
        )?;
        conn.create_window(
            resize_handle,
            frame,
            layout.resize_handle,
            deco.handle_color,
            draggable,
        )?;

        // Title changes are tracked on the client itself
        conn.select_input(client, EventMask::PROPERTY_CHANGE)?;
        conn.reparent_window(client, frame, layout.client.x, layout.client.y)?;
        conn.change_save_set(client, SetMode::INSERT)?;

        Ok(Self {
            client,
            frame,
            titlebar,
            close_button,
            zoom_button,
            resize_handle,
        })
    }

    /// Frame and decoration windows, frame first
    pub fn windows(&self) -> [Window; 5] {
        [
            self.frame,
            self.titlebar,
            self.close_button,
            self.zoom_button,
            self.resize_handle,
        ]
    }

    /// Get the frame part a window id refers to
    pub fn part_of(&self, window: Window) -> Option<FramePart> {
        if window == self.frame {
            Some(FramePart::Frame)
        } else if window == self.titlebar {
            Some(FramePart::TitleBar)
        } else if window == self.close_button {
            Some(FramePart::Close)
        } else if window == self.zoom_button {
            Some(FramePart::Zoom)
        } else if window == self.resize_handle {
            Some(FramePart::ResizeHandle)
        } else {
            None
        }
    }

    /// Map the decorations, the frame and the client
    pub fn map<C: XConn>(&self, conn: &C) -> Result<()> {
        for window in self.windows() {
            conn.map_window(window)?;
        }
        conn.map_window(self.client)?;
        Ok(())
    }

    /// Lay out the decorations and the client for a frame of the given size.
    /// The frame window itself is not touched.
    pub fn relayout<C: XConn>(
        &self,
        conn: &C,
        width: u32,
        height: u32,
        deco: &DecorationConfig,
    ) -> Result<()> {
        let layout = DecorationLayout::new(width, height, deco);
        conn.resize_window(self.titlebar, layout.titlebar.width, layout.titlebar.height)?;
        conn.resize_window(self.client, layout.client.width, layout.client.height)?;
        conn.move_window(self.close_button, layout.close.x, layout.close.y)?;
        conn.move_window(self.zoom_button, layout.zoom.x, layout.zoom.y)?;
        conn.move_window(self.resize_handle, layout.resize_handle.x, layout.resize_handle.y)?;
        Ok(())
    }

    /// Raise the whole stack; the client ends up on top of its decorations
    pub fn raise<C: XConn>(&self, conn: &C) -> Result<()> {
        for window in self.windows() {
            conn.raise_window(window)?;
        }
        conn.raise_window(self.client)?;
        Ok(())
    }

    /// Hand the client back to the root and destroy the frame
    pub fn destroy<C: XConn>(&self, conn: &C) -> Result<()> {
        conn.unmap_window(self.client)?;
        conn.reparent_window(self.client, conn.root(), 0, 0)?;
        conn.change_save_set(self.client, SetMode::DELETE)?;
        // Destroying the frame takes the decoration children with it
        conn.destroy_window(self.frame)?;
        Ok(())
    }
}
