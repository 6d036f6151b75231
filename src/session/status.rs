//! Connection/activity status reporting

use crate::controller::ButtonSet;
use tokio::sync::watch;

/// Snapshot handed to status observers after every state-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStatus {
    pub connected: bool,
    /// Buttons active in the latest report (level, not edges)
    pub active: ButtonSet,
}

impl DeviceStatus {
    pub fn connected(active: ButtonSet) -> Self {
        Self {
            connected: true,
            active,
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Presentation-side consumer of [`DeviceStatus`] updates
///
/// Called once per report, so implementations must be cheap.
pub trait StatusObserver: Send + 'static {
    fn status_changed(&mut self, status: DeviceStatus);
}

/// Publishes the latest status on a watch channel
///
/// Slow readers only ever see the most recent value.
#[derive(Debug)]
pub struct WatchStatusObserver {
    sender: watch::Sender<DeviceStatus>,
}

impl WatchStatusObserver {
    pub fn channel() -> (Self, watch::Receiver<DeviceStatus>) {
        let (sender, receiver) = watch::channel(DeviceStatus::disconnected());
        (Self { sender }, receiver)
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceStatus> {
        self.sender.subscribe()
    }
}

impl StatusObserver for WatchStatusObserver {
    fn status_changed(&mut self, status: DeviceStatus) {
        // Keeps the value even when nobody is subscribed right now
        self.sender.send_replace(status);
    }
}
