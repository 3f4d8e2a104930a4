//! Types shared between the window manager modules.

pub mod window_state;

pub use window_state::{Geometry, SnapState};
