//! Configuration system for sevenwm
//!
//! Loads configuration from TOML file at `~/.config/sevenwm/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::wm::keyboard::parse_modifier;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window_manager: WindowManagerConfig,
    pub decorations: DecorationConfig,
    pub snap: SnapConfig,
    pub drag: DragConfig,
    pub resize: ResizeConfig,
    pub keybindings: KeybindingsConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            // Auto-generate default config file
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("sevenwm");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }

    /// Reject values that would produce a degenerate frame layout
    pub fn validate(&self) -> Result<()> {
        let deco = &self.decorations;
        if deco.titlebar_height == 0 {
            bail!("decorations.titlebar_height must be greater than zero");
        }
        if deco.button_size > deco.titlebar_height {
            bail!(
                "decorations.button_size ({}) does not fit in the titlebar ({})",
                deco.button_size,
                deco.titlebar_height
            );
        }
        if self.resize.min_width <= deco.horizontal_inset() + deco.resize_handle_size {
            bail!(
                "resize.min_width ({}) must exceed the frame's horizontal decorations",
                self.resize.min_width
            );
        }
        if self.resize.min_height <= deco.vertical_inset() + deco.resize_handle_size {
            bail!(
                "resize.min_height ({}) must exceed the frame's vertical decorations",
                self.resize.min_height
            );
        }
        parse_modifier(&self.keybindings.modifier)?;
        Ok(())
    }
}

/// General window manager behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowManagerConfig {
    /// Title shown for clients that set neither _NET_WM_NAME nor WM_NAME
    pub default_title: String,
}

impl Default for WindowManagerConfig {
    fn default() -> Self {
        Self {
            default_title: "Untitled".to_string(),
        }
    }
}

/// Window decoration geometry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Titlebar height in pixels
    pub titlebar_height: u32,
    /// Border thickness around the client in pixels
    pub border_width: u32,
    /// Close/zoom button size in pixels
    pub button_size: u32,
    /// Distance between a button and the titlebar edge
    pub button_margin: u32,
    /// Resize handle size in pixels
    pub resize_handle_size: u32,
    /// Frame background (hex: 0xRRGGBB)
    pub frame_color: u32,
    /// Titlebar background (hex: 0xRRGGBB)
    pub titlebar_color: u32,
    /// Close/zoom button background (hex: 0xRRGGBB)
    pub button_color: u32,
    /// Resize handle background (hex: 0xRRGGBB)
    pub handle_color: u32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            titlebar_height: 22,
            border_width: 2,
            button_size: 12,
            button_margin: 8,
            resize_handle_size: 12,
            frame_color: 0xc0c0c0,
            titlebar_color: 0x808080,
            button_color: 0xffffff,
            handle_color: 0x404040,
        }
    }
}

impl DecorationConfig {
    /// Width the frame adds around the client
    pub fn horizontal_inset(&self) -> u32 {
        self.border_width * 2
    }

    /// Height the frame adds around the client
    pub fn vertical_inset(&self) -> u32 {
        self.titlebar_height + self.border_width * 2
    }
}

/// Edge bands that trigger a snap when a drag ends inside them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub left_band: u32,
    pub right_band: u32,
    pub top_band: u32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            left_band: 50,
            right_band: 50,
            top_band: 10,
        }
    }
}

/// How much of a dragged frame must stay on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub min_visible_x: u32,
    pub min_visible_y: u32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            min_visible_x: 100,
            min_visible_y: 50,
        }
    }
}

/// Smallest frame an interactive resize may produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_width: 100,
            min_height: 80,
        }
    }
}

/// Keyboard shortcuts configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    /// Modifier held with the arrow keys: "super", "alt", "control" or "shift"
    pub modifier: String,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            modifier: "super".to_string(),
        }
    }
}
