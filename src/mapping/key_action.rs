//! Keyboard actions a button can be mapped to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Modifier bits sent along with a key event
///
/// Bit values follow the CGEventFlags masks so that stored mappings can be
/// handed to a macOS event tap unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierFlags(u64);

impl ModifierFlags {
    pub const NONE: ModifierFlags = ModifierFlags(0);
    pub const SHIFT: ModifierFlags = ModifierFlags(0x0002_0000);
    pub const CONTROL: ModifierFlags = ModifierFlags(0x0004_0000);
    pub const OPTION: ModifierFlags = ModifierFlags(0x0008_0000);
    pub const COMMAND: ModifierFlags = ModifierFlags(0x0010_0000);

    const KNOWN: u64 = Self::SHIFT.0 | Self::CONTROL.0 | Self::OPTION.0 | Self::COMMAND.0;

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: ModifierFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits that are not one of the four supported modifiers
    pub const fn unknown_bits(self) -> u64 {
        self.0 & !Self::KNOWN
    }

    /// Human readable prefix such as `Shift+Cmd+`
    pub fn prefix(self) -> String {
        let mut out = String::new();
        for (flag, name) in [
            (Self::CONTROL, "Ctrl+"),
            (Self::OPTION, "Option+"),
            (Self::SHIFT, "Shift+"),
            (Self::COMMAND, "Cmd+"),
        ] {
            if self.contains(flag) {
                out.push_str(name);
            }
        }
        out
    }
}

impl BitOr for ModifierFlags {
    type Output = ModifierFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ModifierFlags(self.0 | rhs.0)
    }
}

impl fmt::Debug for ModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModifierFlags({:#x})", self.0)
    }
}

/// Keyboard action bound to a button
///
/// `label` is descriptive only, but it takes part in equality so that a
/// stored mapping compares equal only to an identical one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyAction {
    pub key_code: u16,
    #[serde(default)]
    pub modifiers: ModifierFlags,
    #[serde(default)]
    pub label: String,
}

impl KeyAction {
    /// Don't forward this button
    pub const NONE: KeyAction = KeyAction {
        key_code: 0,
        modifiers: ModifierFlags::NONE,
        label: String::new(),
    };

    pub fn new(key_code: u16, modifiers: ModifierFlags, label: impl Into<String>) -> Self {
        Self {
            key_code,
            modifiers,
            label: label.into(),
        }
    }

    /// The "no action" sentinel
    pub fn none() -> Self {
        Self::new(0, ModifierFlags::NONE, "None")
    }

    /// True for the sentinel, with or without its label
    pub fn is_none(&self) -> bool {
        *self == Self::NONE || *self == Self::none()
    }
}

impl Default for KeyAction {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.label.is_empty() {
            f.write_str(&self.label)
        } else {
            write!(f, "{}Key({:#04x})", self.modifiers.prefix(), self.key_code)
        }
    }
}
