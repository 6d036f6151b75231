//! Device session lifecycle
//!
//! 1. [`session_controller`] - connect / report / disconnect state machine
//! 2. [`session_handle`] - single-task owner fed by transports and config
//! 3. [`status`] - observer contract for presentation layers

pub mod session_controller;
pub mod session_handle;
pub mod status;

pub use session_controller::{DeviceSession, ReportOutcome, SessionController};
pub use session_handle::{DeviceEvent, DeviceEventSender, SessionError, SessionHandle};
pub use status::{DeviceStatus, StatusObserver, WatchStatusObserver};
