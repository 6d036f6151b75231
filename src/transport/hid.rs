//! hidapi-backed transport
//!
//! Reads run on a blocking thread: `read_timeout` never awaits, and the
//! timeout doubles as the interval at which cancellation is checked.

use super::TransportError;
use crate::persistence::DeviceConfig;
use crate::session::{DeviceEvent, DeviceEventSender};
use hidapi::{HidApi, HidDevice};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct HidTransport {
    config: DeviceConfig,
    events: DeviceEventSender,
}

impl HidTransport {
    pub fn new(config: DeviceConfig, events: DeviceEventSender) -> Self {
        Self { config, events }
    }

    /// Starts the connect/read/reconnect loop on the blocking pool
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<Result<(), TransportError>> {
        info!(
            "Starting HID transport for VID 0x{:04X} PID 0x{:04X}",
            self.config.vendor_id, self.config.product_id
        );
        tokio::task::spawn_blocking(move || self.run(&token))
    }

    fn run(&self, token: &CancellationToken) -> Result<(), TransportError> {
        let mut api = HidApi::new()?;
        let reconnect = Duration::from_millis(self.config.reconnect_interval_ms);

        while !token.is_cancelled() {
            match self.open(&mut api) {
                Ok(device) => {
                    info!("Gamepad connected");
                    self.events.blocking_send(DeviceEvent::Connected)?;
                    self.read_reports(&device, token)?;
                    self.events.blocking_send(DeviceEvent::Disconnected)?;
                    info!("Gamepad disconnected");
                }
                Err(TransportError::DeviceNotFound { .. }) => {
                    debug!("Gamepad not present, retrying in {:?}", reconnect);
                }
                Err(e) => warn!("Failed to open gamepad: {}", e),
            }
            wait_or_cancel(token, reconnect);
        }

        debug!("HID transport stopped");
        Ok(())
    }

    fn open(&self, api: &mut HidApi) -> Result<HidDevice, TransportError> {
        let DeviceConfig {
            vendor_id,
            product_id,
            ..
        } = self.config;

        api.refresh_devices()?;
        let present = api
            .device_list()
            .any(|info| info.vendor_id() == vendor_id && info.product_id() == product_id);
        if !present {
            return Err(TransportError::DeviceNotFound {
                vendor_id,
                product_id,
            });
        }

        Ok(api.open(vendor_id, product_id)?)
    }

    /// Forwards reports until the device fails or the token is cancelled
    fn read_reports(
        &self,
        device: &HidDevice,
        token: &CancellationToken,
    ) -> Result<(), TransportError> {
        let mut buf = vec![0u8; self.config.report_buffer_size];

        while !token.is_cancelled() {
            match device.read_timeout(&mut buf, self.config.read_timeout_ms) {
                Ok(0) => continue,
                Ok(len) => self
                    .events
                    .blocking_send(DeviceEvent::Report(buf[..len].to_vec()))?,
                Err(e) => {
                    warn!("Gamepad read failed: {}", e);
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Sleeps for `total`, waking early once the token is cancelled
fn wait_or_cancel(token: &CancellationToken, total: Duration) {
    const STEP: Duration = Duration::from_millis(50);
    let deadline = Instant::now() + total;
    while !token.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(STEP.min(deadline - now));
    }
}
