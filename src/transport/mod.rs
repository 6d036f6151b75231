//! Device transports
//!
//! A transport turns a physical connection into [`DeviceEvent`]s for the
//! session task: `Connected`, then any number of `Report`s, then
//! `Disconnected`. Reconnection is the transport's business; the session
//! only ever sees the event stream.
//!
//! [`DeviceEvent`]: crate::session::DeviceEvent

pub mod hid;

pub use hid::HidTransport;

use crate::session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Device not found (VID 0x{vendor_id:04X}, PID 0x{product_id:04X})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Session closed: {0}")]
    SessionClosed(#[from] SessionError),
}
