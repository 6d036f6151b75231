//! Configuration-side owner of the button assignments
//!
//! Edits always publish a complete [`KeyMap`]; subscribers (the session
//! task) never see a half-edited table.

use crate::controller::LogicalButton;
use crate::mapping::{KeyAction, KeyMap, PresetAction};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug)]
pub struct MappingStore {
    sender: watch::Sender<KeyMap>,
}

impl MappingStore {
    pub fn new(initial: KeyMap) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Receiver that yields the current map and every later replacement
    pub fn subscribe(&self) -> watch::Receiver<KeyMap> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> KeyMap {
        self.sender.borrow().clone()
    }

    pub fn set_mapping(&self, button: LogicalButton, action: KeyAction) {
        let changed = self.sender.send_if_modified(|map| {
            if map.lookup(button) == &action {
                return false;
            }
            map.set(button, action.clone());
            true
        });
        if changed {
            info!("Mapping for {} set to {}", button, action);
        } else {
            debug!("Mapping for {} unchanged", button);
        }
    }

    pub fn apply_preset(&self, button: LogicalButton, preset: PresetAction) {
        self.set_mapping(button, preset.key_action());
    }

    /// Replaces every assignment at once
    pub fn replace(&self, map: KeyMap) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == map {
                return false;
            }
            *current = map;
            true
        });
        if changed {
            info!("Mapping table reloaded");
        }
    }

    pub fn reset_to_defaults(&self) {
        self.replace(KeyMap::defaults());
    }
}

impl Default for MappingStore {
    fn default() -> Self {
        Self::new(KeyMap::defaults())
    }
}
