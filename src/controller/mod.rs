//! Controller subsystem for gamepad report handling
//!
//! Implements the input half of the pipeline:
//!
//! 1. [`catalog`] - Static button catalog and decode rules
//! 2. [`report_decoder`] - Raw report bytes to active button set
//! 3. [`edge_tracker`] - Press/release edges between consecutive reports
//!
//! # Architecture
//!
//! ```text
//! Raw Report ──► Decoder ──► ButtonSet ──► EdgeTracker ──► Transitions
//!                (pure)                    (stateful)
//! ```

pub mod catalog;
pub mod edge_tracker;
pub mod report_decoder;

pub use catalog::{
    AxisThreshold, ButtonGroup, ButtonSet, DecodeRule, LogicalButton, BUTTON_COUNT,
};
pub use edge_tracker::{EdgeKind, EdgeTracker, Transition};
pub use report_decoder::{decode_report, DecodeError, MIN_REPORT_LEN};
