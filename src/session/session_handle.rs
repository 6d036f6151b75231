//! Session Handle - owns the controller on a single tokio task
//!
//! Device events and mapping updates come from different producers. The
//! handle funnels both onto one task so button state and held keys are only
//! ever touched from one place.
//!
//! ```text
//! Transport ─[DeviceEvent]──► mpsc(256) ──┐
//!                                         ├──► Session Task ──► KeySink
//! MappingStore ─[KeyMap]────► watch ──────┘         │
//!                                                   └──► StatusObserver
//! ```

use super::session_controller::SessionController;
use crate::mapping::KeyMap;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const EVENT_BUFFER: usize = 256;

/// Lifecycle events delivered by a device transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Connected,
    Report(Vec<u8>),
    Disconnected,
}

#[derive(Debug)]
enum SessionCommand {
    Device(DeviceEvent),
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session task is no longer running")]
    ChannelClosed,

    #[error("Session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SessionController {
    /// Applies one transport event
    pub fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Connected => self.connect(),
            DeviceEvent::Report(report) => {
                self.report_arrived(&report);
            }
            DeviceEvent::Disconnected => self.disconnect(),
        }
    }
}

/// Cloneable entry point for transports
#[derive(Debug, Clone)]
pub struct DeviceEventSender {
    sender: mpsc::Sender<SessionCommand>,
}

impl DeviceEventSender {
    pub async fn send(&self, event: DeviceEvent) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Device(event))
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// For transports running on a plain thread; must not be called from async code
    pub fn blocking_send(&self, event: DeviceEvent) -> Result<(), SessionError> {
        self.sender
            .blocking_send(SessionCommand::Device(event))
            .map_err(|_| SessionError::ChannelClosed)
    }
}

pub struct SessionHandle {
    sender: DeviceEventSender,
    task: JoinHandle<SessionController>,
}

impl SessionHandle {
    /// Spawns the session task.
    ///
    /// The current value of `mapping_updates` replaces the controller's table
    /// before the first event is handled; every later change is applied
    /// between events.
    pub fn spawn(controller: SessionController, mapping_updates: watch::Receiver<KeyMap>) -> Self {
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        debug!("Created session event channel with capacity {}", EVENT_BUFFER);

        let task = tokio::spawn(run_session(controller, receiver, mapping_updates));
        info!("Session task spawned");

        Self {
            sender: DeviceEventSender { sender },
            task,
        }
    }

    pub fn sender(&self) -> DeviceEventSender {
        self.sender.clone()
    }

    /// Stops the task after all queued events, releasing any held keys.
    ///
    /// Returns the controller so callers can inspect its final state.
    pub async fn shutdown(self) -> Result<SessionController, SessionError> {
        if self.sender.sender.send(SessionCommand::Shutdown).await.is_err() {
            error!("Session task exited before shutdown");
        }
        Ok(self.task.await?)
    }
}

async fn run_session(
    mut controller: SessionController,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut mapping_updates: watch::Receiver<KeyMap>,
) -> SessionController {
    let initial = mapping_updates.borrow_and_update().clone();
    controller.mapping_changed(initial);

    let mut watching = true;
    loop {
        tokio::select! {
            biased;

            changed = mapping_updates.changed(), if watching => match changed {
                Ok(()) => {
                    let map = mapping_updates.borrow_and_update().clone();
                    controller.mapping_changed(map);
                }
                Err(_) => {
                    debug!("Mapping source closed, keeping current table");
                    watching = false;
                }
            },

            command = commands.recv() => match command {
                Some(SessionCommand::Device(event)) => controller.handle_event(event),
                Some(SessionCommand::Shutdown) | None => break,
            },
        }
    }

    controller.disconnect();
    info!("Session task stopped");
    controller
}
