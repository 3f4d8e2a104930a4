//! Window geometry and layout state

/// Window geometry, root-relative for frames and frame-relative for
/// decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Same rectangle moved to a new origin.
    pub fn with_origin(self, x: i32, y: i32) -> Self {
        Self { x, y, ..self }
    }

    /// Same origin with a new size.
    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self { width, height, ..self }
    }
}

/// Edge-docked layout of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapState {
    #[default]
    None,
    LeftHalf,
    RightHalf,
    Maximized,
}

impl SnapState {
    pub fn is_snapped(self) -> bool {
        self != SnapState::None
    }
}
