//! Placement policy
//!
//! Pure geometry: snap targets, snap zones, drag clamping and resize limits.
//! Everything here is a function of its arguments so the interaction code
//! can be tested without a display.

use crate::config::{DecorationConfig, DragConfig, ResizeConfig, SnapConfig};
use crate::shared::{Geometry, SnapState};

/// Frame rectangle for a snap state on a `width`×`height` screen.
/// `None` for `SnapState::None`, which has no target of its own.
pub fn snap_target(state: SnapState, width: u32, height: u32) -> Option<Geometry> {
    let half = width / 2;
    match state {
        SnapState::None => None,
        SnapState::LeftHalf => Some(Geometry::new(0, 0, half, height)),
        SnapState::RightHalf => Some(Geometry::new(half as i32, 0, half, height)),
        SnapState::Maximized => Some(Geometry::new(0, 0, width, height)),
    }
}

/// Snap state selected by releasing a drag at (`x`, `y`).
/// The left band wins over the right band, which wins over the top band.
pub fn snap_zone(x: i32, y: i32, screen_width: u32, zones: &SnapConfig) -> SnapState {
    if x < zones.left_band as i32 {
        SnapState::LeftHalf
    } else if x > screen_width as i32 - zones.right_band as i32 {
        SnapState::RightHalf
    } else if y < zones.top_band as i32 {
        SnapState::Maximized
    } else {
        SnapState::None
    }
}

/// Keep a dragged frame's origin inside the screen so that at least the
/// configured margin stays visible.
pub fn clamp_drag(x: i32, y: i32, screen: (u32, u32), drag: &DragConfig) -> (i32, i32) {
    let max_x = (screen.0 as i32 - drag.min_visible_x as i32).max(0);
    let max_y = (screen.1 as i32 - drag.min_visible_y as i32).max(0);
    (x.clamp(0, max_x), y.clamp(0, max_y))
}

/// Frame size after dragging the resize handle by (`dx`, `dy`)
pub fn resized(start: Geometry, dx: i32, dy: i32, limits: &ResizeConfig) -> (u32, u32) {
    let width = (start.width as i32 + dx).max(limits.min_width as i32);
    let height = (start.height as i32 + dy).max(limits.min_height as i32);
    (width as u32, height as u32)
}

/// Pointer offset that keeps a frame restored mid-drag centred under the
/// cursor, holding it by the middle of its titlebar.
pub fn detach_offset(frame: Geometry, deco: &DecorationConfig) -> (i32, i32) {
    (
        (frame.width / 2) as i32,
        (deco.border_width + deco.titlebar_height / 2) as i32,
    )
}
