//! Static button catalog for the 8BitDo Micro report layout
//!
//! The catalog is the single source of truth for which logical buttons exist,
//! in which order they are evaluated and how each one is read out of a raw
//! input report. Nothing in here changes at runtime.

use crate::mapping::MappingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of logical buttons in the catalog
pub const BUTTON_COUNT: usize = 16;

/// Axis values below this count as the low direction (left / up)
pub const AXIS_LOW_THRESHOLD: u8 = 0x40;

/// Axis values above this count as the high direction (right / down)
pub const AXIS_HIGH_THRESHOLD: u8 = 0xC0;

/// Which half of an analog axis activates a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisThreshold {
    /// Active iff value < 0x40
    Low,
    /// Active iff value > 0xC0
    High,
}

impl AxisThreshold {
    pub fn is_active(self, value: u8) -> bool {
        match self {
            AxisThreshold::Low => value < AXIS_LOW_THRESHOLD,
            AxisThreshold::High => value > AXIS_HIGH_THRESHOLD,
        }
    }
}

/// How a single button is read from a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeRule {
    /// Active iff `report[byte] & mask != 0`
    ByteMask { byte: usize, mask: u8 },
    /// Active iff `report[byte]` lies beyond the threshold
    AnalogAxis { byte: usize, threshold: AxisThreshold },
}

impl DecodeRule {
    /// Byte offset the rule reads
    pub fn byte_index(&self) -> usize {
        match *self {
            DecodeRule::ByteMask { byte, .. } | DecodeRule::AnalogAxis { byte, .. } => byte,
        }
    }

    /// Evaluates the rule against a report that is already known to be long enough
    pub fn evaluate(&self, report: &[u8]) -> bool {
        match *self {
            DecodeRule::ByteMask { byte, mask } => report[byte] & mask != 0,
            DecodeRule::AnalogAxis { byte, threshold } => threshold.is_active(report[byte]),
        }
    }
}

/// Physical grouping, used for presentation only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonGroup {
    Face,
    Shoulder,
    Directional,
    Auxiliary,
}

/// Logical gamepad button
///
/// Declaration order is catalog order. `Ord` follows it, so ordered
/// collections of buttons iterate the same way the decoder does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalButton {
    B,
    A,
    Y,
    X,
    L,
    R,
    ZL,
    ZR,
    #[serde(rename = "D-Up")]
    DPadUp,
    #[serde(rename = "D-Down")]
    DPadDown,
    #[serde(rename = "D-Left")]
    DPadLeft,
    #[serde(rename = "D-Right")]
    DPadRight,
    Minus,
    Plus,
    Home,
    Capture,
}

impl LogicalButton {
    /// All buttons in catalog order
    pub const ALL: [LogicalButton; BUTTON_COUNT] = [
        LogicalButton::B,
        LogicalButton::A,
        LogicalButton::Y,
        LogicalButton::X,
        LogicalButton::L,
        LogicalButton::R,
        LogicalButton::ZL,
        LogicalButton::ZR,
        LogicalButton::DPadUp,
        LogicalButton::DPadDown,
        LogicalButton::DPadLeft,
        LogicalButton::DPadRight,
        LogicalButton::Minus,
        LogicalButton::Plus,
        LogicalButton::Home,
        LogicalButton::Capture,
    ];

    /// Position in catalog order
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn decode_rule(self) -> DecodeRule {
        use AxisThreshold::{High, Low};
        use DecodeRule::{AnalogAxis, ByteMask};

        match self {
            // Byte 1: face and shoulder buttons
            LogicalButton::B => ByteMask { byte: 1, mask: 0x01 },
            LogicalButton::A => ByteMask { byte: 1, mask: 0x02 },
            LogicalButton::Y => ByteMask { byte: 1, mask: 0x04 },
            LogicalButton::X => ByteMask { byte: 1, mask: 0x08 },
            LogicalButton::L => ByteMask { byte: 1, mask: 0x10 },
            LogicalButton::R => ByteMask { byte: 1, mask: 0x20 },
            LogicalButton::ZL => ByteMask { byte: 1, mask: 0x40 },
            LogicalButton::ZR => ByteMask { byte: 1, mask: 0x80 },
            // Byte 2: auxiliary buttons
            LogicalButton::Minus => ByteMask { byte: 2, mask: 0x01 },
            LogicalButton::Plus => ByteMask { byte: 2, mask: 0x02 },
            LogicalButton::Home => ByteMask { byte: 2, mask: 0x10 },
            LogicalButton::Capture => ByteMask { byte: 2, mask: 0x20 },
            // D-pad reports as analog axes: byte 5 = X, byte 7 = Y
            LogicalButton::DPadLeft => AnalogAxis { byte: 5, threshold: Low },
            LogicalButton::DPadRight => AnalogAxis { byte: 5, threshold: High },
            LogicalButton::DPadUp => AnalogAxis { byte: 7, threshold: Low },
            LogicalButton::DPadDown => AnalogAxis { byte: 7, threshold: High },
        }
    }

    /// Display name, also used as the key in configuration files
    pub fn name(self) -> &'static str {
        match self {
            LogicalButton::B => "B",
            LogicalButton::A => "A",
            LogicalButton::Y => "Y",
            LogicalButton::X => "X",
            LogicalButton::L => "L",
            LogicalButton::R => "R",
            LogicalButton::ZL => "ZL",
            LogicalButton::ZR => "ZR",
            LogicalButton::DPadUp => "D-Up",
            LogicalButton::DPadDown => "D-Down",
            LogicalButton::DPadLeft => "D-Left",
            LogicalButton::DPadRight => "D-Right",
            LogicalButton::Minus => "Minus",
            LogicalButton::Plus => "Plus",
            LogicalButton::Home => "Home",
            LogicalButton::Capture => "Capture",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            LogicalButton::DPadUp => "↑",
            LogicalButton::DPadDown => "↓",
            LogicalButton::DPadLeft => "←",
            LogicalButton::DPadRight => "→",
            other => other.name(),
        }
    }

    pub fn group(self) -> ButtonGroup {
        match self {
            LogicalButton::B | LogicalButton::A | LogicalButton::Y | LogicalButton::X => {
                ButtonGroup::Face
            }
            LogicalButton::L | LogicalButton::R | LogicalButton::ZL | LogicalButton::ZR => {
                ButtonGroup::Shoulder
            }
            LogicalButton::DPadUp
            | LogicalButton::DPadDown
            | LogicalButton::DPadLeft
            | LogicalButton::DPadRight => ButtonGroup::Directional,
            LogicalButton::Minus
            | LogicalButton::Plus
            | LogicalButton::Home
            | LogicalButton::Capture => ButtonGroup::Auxiliary,
        }
    }

    fn bit(self) -> u16 {
        1 << self.index()
    }
}

impl fmt::Display for LogicalButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalButton {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalButton::ALL
            .into_iter()
            .find(|button| button.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MappingError::UnknownButton(s.to_string()))
    }
}

/// Set of logical buttons, stored as one bit per catalog slot
///
/// Iteration always yields buttons in catalog order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButtonSet(u16);

impl ButtonSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, button: LogicalButton) {
        self.0 |= button.bit();
    }

    pub fn remove(&mut self, button: LogicalButton) {
        self.0 &= !button.bit();
    }

    pub fn contains(&self, button: LogicalButton) -> bool {
        self.0 & button.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = LogicalButton> + '_ {
        LogicalButton::ALL
            .into_iter()
            .filter(move |button| self.contains(*button))
    }
}

impl FromIterator<LogicalButton> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = LogicalButton>>(iter: I) -> Self {
        let mut set = ButtonSet::empty();
        for button in iter {
            set.insert(button);
        }
        set
    }
}

impl fmt::Debug for ButtonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
