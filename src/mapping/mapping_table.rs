//! Live button → key action table
//!
//! [`KeyMap`] is an immutable value covering every catalog button.
//! [`MappingTable`] is the shared slot holding the current `KeyMap`; writers
//! swap in a whole new map, readers take an `Arc` snapshot and keep using it
//! for as long as they need a consistent view.

use super::key_action::KeyAction;
use super::presets::PresetAction;
use crate::controller::{LogicalButton, BUTTON_COUNT};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Complete assignment of actions to catalog buttons
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMap {
    actions: [KeyAction; BUTTON_COUNT],
}

impl KeyMap {
    /// Every button resolves to "none"
    pub fn unmapped() -> Self {
        Self {
            actions: std::array::from_fn(|_| KeyAction::none()),
        }
    }

    /// Default policy: R → Option+Space, ZL → Escape, ZR → Enter
    pub fn defaults() -> Self {
        LogicalButton::ALL
            .into_iter()
            .map(|button| (button, PresetAction::default_for(button).key_action()))
            .collect()
    }

    pub fn with(mut self, button: LogicalButton, action: KeyAction) -> Self {
        self.set(button, action);
        self
    }

    pub fn set(&mut self, button: LogicalButton, action: KeyAction) {
        self.actions[button.index()] = action;
    }

    pub fn lookup(&self, button: LogicalButton) -> &KeyAction {
        &self.actions[button.index()]
    }

    /// Buttons and their actions in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (LogicalButton, &KeyAction)> {
        LogicalButton::ALL.into_iter().zip(self.actions.iter())
    }

    /// Number of buttons that forward a key
    pub fn mapped_count(&self) -> usize {
        self.actions.iter().filter(|action| !action.is_none()).count()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::unmapped()
    }
}

impl FromIterator<(LogicalButton, KeyAction)> for KeyMap {
    fn from_iter<I: IntoIterator<Item = (LogicalButton, KeyAction)>>(iter: I) -> Self {
        let mut map = KeyMap::unmapped();
        for (button, action) in iter {
            map.set(button, action);
        }
        map
    }
}

/// Shared, atomically replaceable mapping slot
///
/// Cloning the table clones the handle, not the map.
#[derive(Clone, Debug)]
pub struct MappingTable {
    current: Arc<RwLock<Arc<KeyMap>>>,
}

impl MappingTable {
    pub fn new(initial: KeyMap) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Current map; stays valid even if the table is replaced afterwards
    pub fn snapshot(&self) -> Arc<KeyMap> {
        // Lock is only held for an Arc swap, so a poisoned guard still holds a whole map
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn lookup(&self, button: LogicalButton) -> KeyAction {
        self.snapshot().lookup(button).clone()
    }

    /// Swaps in `map` as a whole
    pub fn replace(&self, map: KeyMap) {
        let mapped = map.mapped_count();
        let new_map = Arc::new(map);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = new_map;
        info!("Mapping table replaced ({} buttons mapped)", mapped);
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new(KeyMap::defaults())
    }
}
