//! Startup errors and protocol error strategies
//!
//! Requests are issued without waiting for a reply, so X11 errors arrive
//! asynchronously in the event stream. The connection routes each one to
//! the `ErrorHandler` it currently holds; the startup probe uses
//! `WmDetector` and then swaps in `ErrorLogger` for the rest of the session.

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;
use tracing::warn;
use x11rb::errors::ConnectError;
use x11rb::protocol::ErrorKind;
use x11rb::x11_utils::X11Error;

/// Fatal conditions detected before the event loop starts
#[derive(Debug, Error)]
pub enum WmError {
    #[error("unable to open display")]
    ConnectionUnavailable(#[source] ConnectError),

    #[error("another window manager is already running")]
    AnotherWmRunning,
}

/// An error reported by the X server for one of our requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolError {
    pub kind: ErrorKind,
    pub bad_value: u32,
    pub request: Option<&'static str>,
}

impl From<&X11Error> for ProtocolError {
    fn from(err: &X11Error) -> Self {
        Self {
            kind: err.error_kind,
            bad_value: err.bad_value,
            request: err.request_name,
        }
    }
}

/// Strategy invoked for every asynchronous protocol error
pub trait ErrorHandler {
    fn on_error(&self, err: &ProtocolError);
}

/// Startup probe: remembers whether selecting SubstructureRedirect on the
/// root was refused.
#[derive(Debug, Default)]
pub struct WmDetector {
    detected: Rc<Cell<bool>>,
}

impl WmDetector {
    /// Handle to the flag, readable after the detector was handed off
    pub fn flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.detected)
    }
}

impl ErrorHandler for WmDetector {
    fn on_error(&self, err: &ProtocolError) {
        if err.kind == ErrorKind::Access {
            self.detected.set(true);
        }
    }
}

/// Steady-state handler: log and carry on
#[derive(Debug, Default)]
pub struct ErrorLogger;

impl ErrorHandler for ErrorLogger {
    fn on_error(&self, err: &ProtocolError) {
        warn!(
            "X error {:?} (request {}, resource 0x{:x})",
            err.kind,
            err.request.unwrap_or("unknown"),
            err.bad_value
        );
    }
}
