//! MoveResize Module
//!
//! Interactive dragging, resizing and edge snapping driven by pointer and
//! keyboard events on frame decorations.

use anyhow::Result;
use tracing::{debug, trace};
use x11rb::protocol::xproto::*;

use crate::config::Config;
use crate::shared::{Geometry, SnapState};
use crate::wm::conn::XConn;
use crate::wm::decorations::FramePart;
use crate::wm::keyboard::KeyboardAction;
use crate::wm::placement;
use crate::wm::registry::ClientRegistry;

const PRIMARY_BUTTON: Button = 1;

/// Move/resize operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResizeOperation {
    /// Dragging by the titlebar; the offset is pointer minus frame origin
    Move { offset_x: i32, offset_y: i32 },
    /// Dragging the bottom-right handle
    Resize,
}

/// Move/resize operation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResizeState {
    /// Client being moved/resized
    pub window: Window,

    /// Start position (root coordinates)
    pub start_x: i32,
    pub start_y: i32,

    /// Frame geometry at start
    pub start_geometry: Geometry,

    pub operation: MoveResizeOperation,
}

/// Move/resize manager
#[derive(Debug, Default)]
pub struct MoveResizeManager {
    /// Current operation, `None` while idle
    pub state: Option<MoveResizeState>,
}

impl MoveResizeManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Raise and focus the client under the pointer, then act on the
    /// decoration that was pressed
    pub fn handle_button_press<C: XConn>(
        &mut self,
        conn: &C,
        clients: &mut ClientRegistry,
        config: &Config,
        event: &ButtonPressEvent,
    ) -> Result<()> {
        let Some((id, part)) = clients.find_by_window(event.event) else {
            trace!("Ignoring button press on unmanaged window 0x{:x}", event.event);
            return Ok(());
        };
        let Some(client) = clients.get_mut(id) else {
            return Ok(());
        };

        client.frame.raise(conn)?;
        conn.set_input_focus(id)?;
        conn.redraw(client.frame.titlebar)?;

        if event.detail != PRIMARY_BUTTON {
            return Ok(());
        }

        let pointer_x = i32::from(event.root_x);
        let pointer_y = i32::from(event.root_y);

        match part {
            FramePart::Close => {
                debug!("Close requested for 0x{:x}", id);
                conn.send_delete_window(id)?;
            }
            FramePart::Zoom => {
                if client.is_snapped() {
                    client.restore(conn, &config.decorations)?;
                } else {
                    client.snap(conn, SnapState::Maximized, conn.screen_size(), &config.decorations)?;
                }
            }
            FramePart::TitleBar => {
                debug!("Starting move for 0x{:x} at ({}, {})", id, pointer_x, pointer_y);
                self.state = Some(MoveResizeState {
                    window: id,
                    start_x: pointer_x,
                    start_y: pointer_y,
                    start_geometry: client.geometry,
                    operation: MoveResizeOperation::Move {
                        offset_x: pointer_x - client.geometry.x,
                        offset_y: pointer_y - client.geometry.y,
                    },
                });
            }
            FramePart::ResizeHandle => {
                debug!("Starting resize for 0x{:x} at ({}, {})", id, pointer_x, pointer_y);
                self.state = Some(MoveResizeState {
                    window: id,
                    start_x: pointer_x,
                    start_y: pointer_y,
                    start_geometry: client.geometry,
                    operation: MoveResizeOperation::Resize,
                });
            }
            FramePart::Frame => {}
        }
        Ok(())
    }

    /// Handle motion during move/resize
    pub fn handle_motion<C: XConn>(
        &mut self,
        conn: &C,
        clients: &mut ClientRegistry,
        config: &Config,
        event: &MotionNotifyEvent,
    ) -> Result<()> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        let Some(client) = clients.get_mut(state.window) else {
            debug!("Client 0x{:x} vanished mid-operation, dropping it", state.window);
            return Ok(());
        };

        let pointer_x = i32::from(event.root_x);
        let pointer_y = i32::from(event.root_y);
        let deco = &config.decorations;

        match state.operation {
            MoveResizeOperation::Move { mut offset_x, mut offset_y } => {
                // Pulling a snapped window off its edge restores it under the pointer
                if client.is_snapped() {
                    client.restore(conn, deco)?;
                    (offset_x, offset_y) = placement::detach_offset(client.geometry, deco);
                    state.operation = MoveResizeOperation::Move { offset_x, offset_y };
                }
                let (x, y) = placement::clamp_drag(
                    pointer_x - offset_x,
                    pointer_y - offset_y,
                    conn.screen_size(),
                    &config.drag,
                );
                client.move_to(conn, x, y)?;
            }
            MoveResizeOperation::Resize => {
                if client.is_snapped() {
                    client.clear_snap();
                }
                let (width, height) = placement::resized(
                    state.start_geometry,
                    pointer_x - state.start_x,
                    pointer_y - state.start_y,
                    &config.resize,
                );
                client.resize_to(conn, width, height, deco)?;
            }
        }

        self.state = Some(state);
        Ok(())
    }

    /// End the operation; a finished drag may snap the window to an edge
    pub fn handle_button_release<C: XConn>(
        &mut self,
        conn: &C,
        clients: &mut ClientRegistry,
        config: &Config,
        event: &ButtonReleaseEvent,
    ) -> Result<()> {
        if event.detail != PRIMARY_BUTTON {
            return Ok(());
        }
        let Some(state) = self.state.take() else {
            return Ok(());
        };
        let MoveResizeOperation::Move { .. } = state.operation else {
            debug!("Finished resize for 0x{:x}", state.window);
            return Ok(());
        };
        let Some(client) = clients.get_mut(state.window) else {
            return Ok(());
        };
        if client.is_snapped() {
            return Ok(());
        }

        let screen = conn.screen_size();
        let zone = placement::snap_zone(
            i32::from(event.root_x),
            i32::from(event.root_y),
            screen.0,
            &config.snap,
        );
        debug!("Finished move for 0x{:x}, snap zone {:?}", state.window, zone);
        client.snap(conn, zone, screen, &config.decorations)
    }

    /// Apply a keyboard shortcut to the focused client
    pub fn handle_key_action<C: XConn>(
        &mut self,
        conn: &C,
        clients: &mut ClientRegistry,
        config: &Config,
        action: KeyboardAction,
    ) -> Result<()> {
        let focus = conn.input_focus()?;
        let Some(id) = clients.client_for(focus) else {
            trace!("Shortcut {:?} with no managed window focused", action);
            return Ok(());
        };
        let Some(client) = clients.get_mut(id) else {
            return Ok(());
        };

        match action {
            KeyboardAction::Snap(state) => {
                client.snap(conn, state, conn.screen_size(), &config.decorations)?;
            }
            KeyboardAction::Restore => {
                client.restore(conn, &config.decorations)?;
            }
        }
        Ok(())
    }
}
