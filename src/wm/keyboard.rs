//! Keyboard Module
//!
//! Arrow-key snapping shortcuts: Left/Right snap to a half, Up maximizes
//! and Down restores the focused window.

use anyhow::{Result, bail};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use x11rb::protocol::xproto::*;

use crate::config::KeybindingsConfig;
use crate::shared::SnapState;
use crate::wm::conn::XConn;

pub const XK_LEFT: Keysym = 0xff51;
pub const XK_UP: Keysym = 0xff52;
pub const XK_RIGHT: Keysym = 0xff53;
pub const XK_DOWN: Keysym = 0xff54;

/// Keyboard shortcut action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardAction {
    /// Snap the focused window
    Snap(SnapState),
    /// Return the focused window to its pre-snap geometry
    Restore,
}

/// Parse a modifier name from the configuration
pub fn parse_modifier(name: &str) -> Result<ModMask> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "super" | "mod4" => ModMask::M4,
        "alt" | "mod1" => ModMask::M1,
        "control" | "ctrl" => ModMask::CONTROL,
        "shift" => ModMask::SHIFT,
        other => bail!("unknown keybinding modifier {:?}", other),
    })
}

/// Keyboard manager
#[derive(Debug, Clone)]
pub struct KeyboardManager {
    /// Modifier that must be held
    pub modifier: ModMask,
    /// Grabbed keycodes
    pub bindings: HashMap<Keycode, KeyboardAction>,
}

impl Default for KeyboardManager {
    fn default() -> Self {
        Self {
            modifier: ModMask::M4,
            bindings: HashMap::new(),
        }
    }
}

impl KeyboardManager {
    /// Grab modifier+arrow on the root window
    pub fn grab<C: XConn>(conn: &C, config: &KeybindingsConfig) -> Result<Self> {
        let modifier = parse_modifier(&config.modifier)?;
        let mut manager = Self {
            modifier,
            bindings: HashMap::new(),
        };

        let keys = [
            (XK_LEFT, KeyboardAction::Snap(SnapState::LeftHalf)),
            (XK_RIGHT, KeyboardAction::Snap(SnapState::RightHalf)),
            (XK_UP, KeyboardAction::Snap(SnapState::Maximized)),
            (XK_DOWN, KeyboardAction::Restore),
        ];

        // Grab with and without CapsLock and NumLock so the shortcut works
        // whatever lock state the keyboard is in
        let combos = [
            modifier,
            modifier | ModMask::LOCK,
            modifier | ModMask::M2,
            modifier | ModMask::LOCK | ModMask::M2,
        ];

        for (keysym, action) in keys {
            let keycodes = conn.keycodes_for(keysym)?;
            if keycodes.is_empty() {
                warn!("No keycode for keysym 0x{:x}, {:?} is unbound", keysym, action);
                continue;
            }
            for keycode in keycodes {
                for mods in combos {
                    conn.grab_key(keycode, mods)?;
                }
                debug!("Bound keycode {} to {:?}", keycode, action);
                manager.bindings.insert(keycode, action);
            }
        }

        info!("Grabbed {} shortcut keys", manager.bindings.len());
        Ok(manager)
    }

    /// Handle key press
    pub fn action_for(&self, event: &KeyPressEvent) -> Option<KeyboardAction> {
        if u16::from(event.state) & u16::from(self.modifier) == 0 {
            return None;
        }
        self.bindings.get(&event.detail).copied()
    }
}
