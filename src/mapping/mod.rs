//! Mapping of logical buttons to synthetic keyboard events
//!
//! Holds the output half of the pipeline: key actions and presets, the
//! atomically replaceable [`MappingTable`] and the [`KeyDispatcher`] that
//! turns edges into key events for a [`KeySink`].
//!
//! ```text
//! Transitions ──► KeyDispatcher ──► KeySink
//!                      ▲
//!                 MappingTable ◄── configuration updates
//! ```

pub mod dispatcher;
pub mod error;
pub mod key_action;
pub mod mapping_table;
pub mod presets;

pub use dispatcher::{ChannelKeySink, KeyDispatcher, KeyEvent, KeySink, TracingKeySink};
pub use error::MappingError;
pub use key_action::{KeyAction, ModifierFlags};
pub use mapping_table::{KeyMap, MappingTable};
pub use presets::PresetAction;
