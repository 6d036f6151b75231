//! Gamepad → keyboard bridge
//!
//! ```text
//! HidTransport ─► SessionHandle ─► SessionController ─► KeyDispatcher ─► KeySink
//!                       ▲                 │
//!   MappingStore ───────┘                 └─► StatusObserver
//! ```
//!
//! The controller, mapping and session layers are pure Rust and need no
//! device; the `hid` feature adds the hidapi transport and the binary.

pub mod controller;
pub mod logging;
pub mod mapping;
pub mod persistence;
pub mod session;
#[cfg(feature = "hid")]
pub mod transport;

pub use controller::{decode_report, ButtonSet, DecodeError, EdgeTracker, LogicalButton};
pub use mapping::{KeyAction, KeyDispatcher, KeyEvent, KeyMap, KeySink, MappingTable, PresetAction};
pub use persistence::{AppConfig, MappingStore};
pub use session::{DeviceEvent, DeviceStatus, SessionController, SessionHandle, StatusObserver};
