//! Press/release edge detection between consecutive reports

use super::catalog::{ButtonSet, LogicalButton};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Pressed,
    Released,
}

/// A single button edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    pub button: LogicalButton,
    pub kind: EdgeKind,
}

impl Transition {
    pub fn pressed(button: LogicalButton) -> Self {
        Self {
            button,
            kind: EdgeKind::Pressed,
        }
    }

    pub fn released(button: LogicalButton) -> Self {
        Self {
            button,
            kind: EdgeKind::Released,
        }
    }
}

/// Remembers which buttons were active in the last accepted report
#[derive(Debug, Default, Clone)]
pub struct EdgeTracker {
    pressed: ButtonSet,
}

impl EdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buttons currently considered pressed
    pub fn pressed(&self) -> ButtonSet {
        self.pressed
    }

    /// Diffs `active` against the stored state and commits it.
    ///
    /// Transitions come out in catalog order. Feeding the same set twice
    /// yields nothing the second time.
    pub fn track(&mut self, active: ButtonSet) -> Vec<Transition> {
        let previous = self.pressed;
        let transitions: Vec<Transition> = LogicalButton::ALL
            .into_iter()
            .filter_map(|button| {
                match (previous.contains(button), active.contains(button)) {
                    (false, true) => Some(Transition::pressed(button)),
                    (true, false) => Some(Transition::released(button)),
                    _ => None,
                }
            })
            .collect();

        self.pressed = active;

        if !transitions.is_empty() {
            debug!("Edges: {:?}", transitions);
        }
        transitions
    }

    /// Releases everything that is currently pressed and clears the state
    pub fn reset(&mut self) -> Vec<Transition> {
        let transitions: Vec<Transition> = self.pressed.iter().map(Transition::released).collect();
        self.pressed.clear();

        if !transitions.is_empty() {
            debug!("Reset released {} buttons", transitions.len());
        }
        transitions
    }
}
