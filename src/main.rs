use color_eyre::{eyre::eyre, Result};
use padbridge::mapping::TracingKeySink;
use padbridge::persistence::{start_reload_task, AppConfig, MappingStore};
use padbridge::session::{DeviceStatus, SessionController, SessionHandle, WatchStatusObserver};
use padbridge::transport::HidTransport;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const CONFIG_POLL_SECONDS: u64 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = AppConfig::path()?;
    let config = AppConfig::load_or_create(&config_path).await?;
    let key_map = config
        .key_map()
        .map_err(|e| eyre!("Invalid mapping in {}: {}", config_path.display(), e))?;
    info!(
        "Loaded {} button mappings from {}",
        key_map.mapped_count(),
        config_path.display()
    );

    let store = Arc::new(MappingStore::new(key_map.clone()));
    let token = CancellationToken::new();

    let (observer, status) = WatchStatusObserver::channel();
    let controller = SessionController::new(
        key_map,
        Box::new(TracingKeySink::default()),
        Box::new(observer),
    );
    let session = SessionHandle::spawn(controller, store.subscribe());

    let reload = start_reload_task(
        config_path,
        store.clone(),
        CONFIG_POLL_SECONDS,
        token.clone(),
    );
    let status_log = tokio::spawn(log_status(status, token.clone()));
    let transport = HidTransport::new(config.device, session.sender()).spawn(token.clone());

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("Failed to listen for ctrl-c: {}", e))?;
    info!("Shutting down");
    token.cancel();

    // Transport first so its final Disconnected still reaches the session
    match transport.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("HID transport failed: {}", e),
        Err(e) => error!("HID transport panicked: {}", e),
    }
    let controller = session.shutdown().await?;
    if controller.has_held_keys() {
        error!("Keys still held after shutdown");
    }

    let _ = reload.await;
    let _ = status_log.await;
    Ok(())
}

async fn log_status(mut status: watch::Receiver<DeviceStatus>, token: CancellationToken) {
    let mut last = *status.borrow_and_update();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            changed = status.changed() => if changed.is_err() { break },
        }

        let current = *status.borrow_and_update();
        if current.connected != last.connected {
            info!("Gamepad {}", if current.connected { "online" } else { "offline" });
        } else if current.active != last.active {
            info!("Active buttons: {:?}", current.active);
        }
        last = current;
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    padbridge::logging::init();
    Ok(())
}
