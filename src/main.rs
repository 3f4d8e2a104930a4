//! sevenwm
//!
//! A small reparenting X11 window manager with titlebars, close/zoom
//! buttons, a resize handle and edge snapping.

mod config;
mod shared;
mod wm;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::wm::WindowManager;
use crate::wm::conn::X11Conn;

fn run() -> Result<()> {
    let config = Config::load()?;
    let conn = X11Conn::connect()?;
    WindowManager::new(conn, config).run()
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "sevenwm=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sevenwm");

    let result = run();
    if let Err(e) = &result {
        error!("Application error: {:#}", e);
    }
    result
}
