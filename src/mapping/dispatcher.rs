//! Key dispatcher: button edges → synthetic key events
//!
//! The dispatcher owns the held-key bookkeeping. A key-down is emitted at
//! most once per logical press, and the action that was resolved at press
//! time is the one released later, no matter how the mapping changed in
//! between.

use super::key_action::{KeyAction, ModifierFlags};
use super::mapping_table::KeyMap;
use crate::controller::{EdgeKind, LogicalButton, Transition};
use chrono::Local;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One synthetic keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key_code: u16,
    pub modifiers: ModifierFlags,
    pub is_down: bool,
}

impl KeyEvent {
    pub fn down(action: &KeyAction) -> Self {
        Self {
            key_code: action.key_code,
            modifiers: action.modifiers,
            is_down: true,
        }
    }

    pub fn up(action: &KeyAction) -> Self {
        Self {
            is_down: false,
            ..Self::down(action)
        }
    }
}

/// Receiver of synthetic key events
///
/// Emission is fire-and-forget: failures stay inside the sink.
pub trait KeySink: Send + 'static {
    fn emit(&mut self, event: KeyEvent);
}

/// Forwards key events to an injector task
///
/// Unbounded: a lagging injector must still receive every key-up, otherwise
/// the key it already pressed would stay down.
#[derive(Debug, Clone)]
pub struct ChannelKeySink {
    sender: mpsc::UnboundedSender<KeyEvent>,
}

impl ChannelKeySink {
    pub fn new(sender: mpsc::UnboundedSender<KeyEvent>) -> Self {
        Self { sender }
    }

    /// Creates a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<KeyEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl KeySink for ChannelKeySink {
    fn emit(&mut self, event: KeyEvent) {
        // Only fails once the injector is gone, at which point nothing is held
        if let Err(e) = self.sender.send(event) {
            warn!("Injector closed, dropping key event {:?}", e.0);
        }
    }
}

/// Logs key events instead of injecting them
#[derive(Debug, Default, Clone)]
pub struct TracingKeySink {
    emitted: u64,
}

impl TracingKeySink {
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl KeySink for TracingKeySink {
    fn emit(&mut self, event: KeyEvent) {
        self.emitted += 1;
        info!(
            "{} {}Key({:#04x}) at {}",
            if event.is_down { "⬇️" } else { "⬆️" },
            event.modifiers.prefix(),
            event.key_code,
            Local::now().format("%H:%M:%S.%3f")
        );
    }
}

/// Turns transitions into key events and tracks which keys are held
pub struct KeyDispatcher {
    sink: Box<dyn KeySink>,
    /// Action emitted on key-down, per button still waiting for its key-up
    held: BTreeMap<LogicalButton, KeyAction>,
}

impl KeyDispatcher {
    pub fn new(sink: Box<dyn KeySink>) -> Self {
        Self {
            sink,
            held: BTreeMap::new(),
        }
    }

    /// Buttons with an outstanding key-down, in catalog order
    pub fn held_buttons(&self) -> impl Iterator<Item = LogicalButton> + '_ {
        self.held.keys().copied()
    }

    pub fn held_action(&self, button: LogicalButton) -> Option<&KeyAction> {
        self.held.get(&button)
    }

    pub fn has_held_keys(&self) -> bool {
        !self.held.is_empty()
    }

    /// Forwards every transition, in order, against one mapping snapshot
    pub fn dispatch(&mut self, transitions: &[Transition], map: &KeyMap) {
        for transition in transitions {
            match transition.kind {
                EdgeKind::Pressed => self.press(transition.button, map),
                EdgeKind::Released => self.release(transition.button),
            }
        }
    }

    /// Emits a key-up for every held key and empties the held set
    pub fn release_all(&mut self) -> usize {
        let held = std::mem::take(&mut self.held);
        let count = held.len();
        for (button, action) in held {
            debug!("Force release {} → {}", button, action);
            self.sink.emit(KeyEvent::up(&action));
        }
        count
    }

    fn press(&mut self, button: LogicalButton, map: &KeyMap) {
        let action = map.lookup(button);
        if action.is_none() {
            debug!("{} pressed, no action mapped", button);
            return;
        }
        if self.held.contains_key(&button) {
            debug!("{} already held, skipping key-down", button);
            return;
        }

        debug!("⬇️ {} → {}", button, action);
        self.sink.emit(KeyEvent::down(action));
        self.held.insert(button, action.clone());
    }

    fn release(&mut self, button: LogicalButton) {
        // Release what was pressed; a fresh lookup could name a different key
        match self.held.remove(&button) {
            Some(action) => {
                debug!("⬆️ {} → {}", button, action);
                self.sink.emit(KeyEvent::up(&action));
            }
            None => debug!("{} released without a held key", button),
        }
    }
}
