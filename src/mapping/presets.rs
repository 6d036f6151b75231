//! Preset actions and the default button assignments
//!
//! Key codes are macOS virtual key codes.

use super::key_action::{KeyAction, ModifierFlags};
use super::MappingError;
use crate::controller::LogicalButton;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetAction {
    None,
    OptionSpace,
    Escape,
    Enter,
    Tab,
    Space,
    CmdZ,
    CmdShiftZ,
    CmdC,
    CmdV,
    CmdS,
    CmdA,
    CmdW,
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
}

impl PresetAction {
    pub const ALL: [PresetAction; 17] = [
        PresetAction::None,
        PresetAction::OptionSpace,
        PresetAction::Escape,
        PresetAction::Enter,
        PresetAction::Tab,
        PresetAction::Space,
        PresetAction::CmdZ,
        PresetAction::CmdShiftZ,
        PresetAction::CmdC,
        PresetAction::CmdV,
        PresetAction::CmdS,
        PresetAction::CmdA,
        PresetAction::CmdW,
        PresetAction::UpArrow,
        PresetAction::DownArrow,
        PresetAction::LeftArrow,
        PresetAction::RightArrow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PresetAction::None => "None",
            PresetAction::OptionSpace => "Option+Space (PTT)",
            PresetAction::Escape => "Escape",
            PresetAction::Enter => "Enter",
            PresetAction::Tab => "Tab",
            PresetAction::Space => "Space",
            PresetAction::CmdZ => "Cmd+Z (Undo)",
            PresetAction::CmdShiftZ => "Cmd+Shift+Z (Redo)",
            PresetAction::CmdC => "Cmd+C (Copy)",
            PresetAction::CmdV => "Cmd+V (Paste)",
            PresetAction::CmdS => "Cmd+S (Save)",
            PresetAction::CmdA => "Cmd+A (Select All)",
            PresetAction::CmdW => "Cmd+W (Close)",
            PresetAction::UpArrow => "Up Arrow",
            PresetAction::DownArrow => "Down Arrow",
            PresetAction::LeftArrow => "Left Arrow",
            PresetAction::RightArrow => "Right Arrow",
        }
    }

    pub fn key_action(self) -> KeyAction {
        let (key_code, modifiers) = match self {
            PresetAction::None => return KeyAction::none(),
            PresetAction::OptionSpace => (0x31, ModifierFlags::OPTION),
            PresetAction::Escape => (0x35, ModifierFlags::NONE),
            PresetAction::Enter => (0x24, ModifierFlags::NONE),
            PresetAction::Tab => (0x30, ModifierFlags::NONE),
            PresetAction::Space => (0x31, ModifierFlags::NONE),
            PresetAction::CmdZ => (0x06, ModifierFlags::COMMAND),
            PresetAction::CmdShiftZ => (0x06, ModifierFlags::COMMAND | ModifierFlags::SHIFT),
            PresetAction::CmdC => (0x08, ModifierFlags::COMMAND),
            PresetAction::CmdV => (0x09, ModifierFlags::COMMAND),
            PresetAction::CmdS => (0x01, ModifierFlags::COMMAND),
            PresetAction::CmdA => (0x00, ModifierFlags::COMMAND),
            PresetAction::CmdW => (0x0D, ModifierFlags::COMMAND),
            PresetAction::UpArrow => (0x7E, ModifierFlags::NONE),
            PresetAction::DownArrow => (0x7D, ModifierFlags::NONE),
            PresetAction::LeftArrow => (0x7B, ModifierFlags::NONE),
            PresetAction::RightArrow => (0x7C, ModifierFlags::NONE),
        };
        KeyAction::new(key_code, modifiers, self.name())
    }

    /// Default assignment for a button when configuration has none
    pub fn default_for(button: LogicalButton) -> PresetAction {
        match button {
            LogicalButton::R => PresetAction::OptionSpace,
            LogicalButton::ZL => PresetAction::Escape,
            LogicalButton::ZR => PresetAction::Enter,
            _ => PresetAction::None,
        }
    }
}

impl fmt::Display for PresetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetAction {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PresetAction::ALL
            .into_iter()
            .find(|preset| {
                preset.name().eq_ignore_ascii_case(wanted)
                    || format!("{preset:?}").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| MappingError::UnknownPreset(s.to_string()))
    }
}
