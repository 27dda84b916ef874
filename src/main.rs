pub mod bridge;
pub mod config;

use crate::bridge::bridge_handle::{BridgeHandle, EventHooks};
use crate::bridge::gilrs_source::GilrsSource;
use crate::config::BridgeConfig;
use color_eyre::eyre::{eyre, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = BridgeConfig::load().await?;
    info!("Starting padbridge with config: {:?}", config);

    let source = GilrsSource::new().map_err(|e| eyre!("Failed to open input backend: {}", e))?;

    let hooks = EventHooks {
        on_status: Some(Box::new(|status| {
            info!("Controller status: {:?}", status.state);
        })),
        ..EventHooks::default()
    };

    let bridge = BridgeHandle::spawn(Some(config.settings()), Box::new(source), hooks)
        .map_err(|e| eyre!("Failed to spawn bridge: {}", e))?;

    // Headless monitor: log every view-model transition. A visual overlay
    // would subscribe the same way.
    let mut view_rx = bridge.subscribe();
    let mut rumble_held = false;
    loop {
        view_rx
            .changed()
            .await
            .map_err(|_| eyre!("Bridge tasks terminated"))?;
        let view = view_rx.borrow().clone();

        // Short rumble on each fresh "a" press, as a round-trip check.
        let a_pressed = view.is_pressed("a");
        if a_pressed && !rumble_held {
            bridge.vibrate(200, 1.0);
        }
        rumble_held = a_pressed;

        let mut pressed: Vec<_> = view.pressed.iter().cloned().collect();
        pressed.sort();
        info!(
            "connected={} pressed=[{}] leftX={:.2} leftY={:.2} rightX={:.2} rightY={:.2}",
            view.connected,
            pressed.join(","),
            view.axes.get("leftX").copied().unwrap_or(0.0),
            view.axes.get("leftY").copied().unwrap_or(0.0),
            view.axes.get("rightX").copied().unwrap_or(0.0),
            view.axes.get("rightY").copied().unwrap_or(0.0),
        );
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
