use anyhow::Result;
use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::config::DecorationConfig;
use crate::shared::{Geometry, SnapState};
use crate::wm::conn::XConn;
use crate::wm::decorations::WindowFrame;
use crate::wm::placement;

/// Window Manager client state
/// Represents a window being managed by the WM
#[derive(Debug, Clone)]
pub struct Client {
    /// X11 window ID
    pub id: Window,

    /// Window frame (decorations)
    pub frame: WindowFrame,

    /// Frame rectangle in root coordinates
    pub geometry: Geometry,

    /// Window title
    pub title: String,

    pub snap_state: SnapState,

    /// Geometry to return to when leaving a snap; set only while snapped
    pub restore_geometry: Option<Geometry>,
}

impl Client {
    pub fn new(frame: WindowFrame, geometry: Geometry, title: String) -> Self {
        Self {
            id: frame.client,
            frame,
            geometry,
            title,
            snap_state: SnapState::None,
            restore_geometry: None,
        }
    }

    pub fn is_snapped(&self) -> bool {
        self.snap_state.is_snapped()
    }

    /// Move the frame without touching its size
    pub fn move_to<C: XConn>(&mut self, conn: &C, x: i32, y: i32) -> Result<()> {
        conn.move_window(self.frame.frame, x, y)?;
        self.geometry = self.geometry.with_origin(x, y);
        Ok(())
    }

    /// Resize the frame in place and lay out its contents again
    pub fn resize_to<C: XConn>(
        &mut self,
        conn: &C,
        width: u32,
        height: u32,
        deco: &DecorationConfig,
    ) -> Result<()> {
        conn.resize_window(self.frame.frame, width, height)?;
        self.frame.relayout(conn, width, height, deco)?;
        self.geometry = self.geometry.with_size(width, height);
        Ok(())
    }

    /// Move and resize the frame in one request
    pub fn apply_geometry<C: XConn>(
        &mut self,
        conn: &C,
        geometry: Geometry,
        deco: &DecorationConfig,
    ) -> Result<()> {
        conn.move_resize_window(self.frame.frame, geometry)?;
        self.frame.relayout(conn, geometry.width, geometry.height, deco)?;
        self.geometry = geometry;
        Ok(())
    }

    /// Snap to `state` on a screen of `screen` size. The restore point is
    /// recorded only when leaving the unsnapped state, so hopping between
    /// snaps keeps the pre-snap geometry.
    pub fn snap<C: XConn>(
        &mut self,
        conn: &C,
        state: SnapState,
        screen: (u32, u32),
        deco: &DecorationConfig,
    ) -> Result<()> {
        let Some(target) = placement::snap_target(state, screen.0, screen.1) else {
            return Ok(());
        };
        if !self.is_snapped() {
            self.restore_geometry = Some(self.geometry);
        }
        debug!("Snapping 0x{:x} to {:?} at {:?}", self.id, state, target);
        self.snap_state = state;
        self.apply_geometry(conn, target, deco)
    }

    /// Leave the snapped state. Returns false when there was nothing to restore.
    pub fn restore<C: XConn>(&mut self, conn: &C, deco: &DecorationConfig) -> Result<bool> {
        let Some(geometry) = self.restore_geometry.take() else {
            return Ok(false);
        };
        debug!("Restoring 0x{:x} to {:?}", self.id, geometry);
        self.snap_state = SnapState::None;
        self.apply_geometry(conn, geometry, deco)?;
        Ok(true)
    }

    /// Forget the snap without moving anything
    pub fn clear_snap(&mut self) {
        self.snap_state = SnapState::None;
        self.restore_geometry = None;
    }

    /// Record a new title, store it on the frame and repaint the titlebar
    pub fn set_title<C: XConn>(&mut self, conn: &C, title: String) -> Result<()> {
        conn.store_name(self.frame.frame, &title)?;
        conn.redraw(self.frame.titlebar)?;
        self.title = title;
        Ok(())
    }
}
