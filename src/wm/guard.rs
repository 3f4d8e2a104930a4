//! Single-instance guard
//!
//! Only one client may select SubstructureRedirect on the root window. We
//! try to, round-trip, and see whether the server refused with BadAccess.

use anyhow::Result;
use tracing::{debug, error, info};
use x11rb::protocol::xproto::EventMask;

use crate::wm::conn::XConn;
use crate::wm::errors::{ErrorLogger, WmDetector, WmError};

/// Events selected on the root window for the whole session
pub fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::POINTER_MOTION
        | EventMask::BUTTON_PRESS
        | EventMask::KEY_PRESS
}

/// Claim the window manager role on the root window.
/// Leaves `ErrorLogger` installed whether or not the claim succeeds.
pub fn become_wm<C: XConn>(conn: &mut C) -> Result<()> {
    let detector = WmDetector::default();
    let detected = detector.flag();
    conn.set_error_handler(Box::new(detector));

    debug!("Selecting SubstructureRedirect on root 0x{:x}", conn.root());
    conn.select_input(conn.root(), root_event_mask())?;
    conn.sync()?;

    conn.set_error_handler(Box::new(ErrorLogger));

    if detected.get() {
        error!("Detected another window manager on display");
        return Err(WmError::AnotherWmRunning.into());
    }

    info!("Successfully became window manager");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::testing::{FakeConn, ROOT, Request};

    #[test]
    fn claims_root_on_idle_display() {
        let mut conn = FakeConn::new(1280, 720);
        become_wm(&mut conn).unwrap();
        assert_eq!(
            conn.requests(),
            vec![Request::SelectInput { window: ROOT, events: root_event_mask() }]
        );
    }

    #[test]
    fn refuses_when_another_wm_holds_redirect() {
        let mut conn = FakeConn::new(1280, 720).with_competing_wm();
        let err = become_wm(&mut conn).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WmError>(),
            Some(WmError::AnotherWmRunning)
        ));
    }
}
