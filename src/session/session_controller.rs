//! Device session controller with statum state machine
//!
//! Drives decoder, edge tracker and dispatcher through the device lifecycle.
//!
//! # State Machine
//!
//! ```text
//!            connect()
//! Disconnected ──────► Connected ──┐
//!      ▲                  │        │ report_arrived()
//!      └──────────────────┘ ◄──────┘
//!         disconnect()
//!      (releases every held key)
//! ```
//!
//! [`DeviceSession`] encodes the phase in its type, so reports can only be
//! processed by a connected session. [`SessionController`] wraps it for
//! callers that receive lifecycle events at runtime.

use super::status::{DeviceStatus, StatusObserver};
use crate::controller::{decode_report, ButtonSet, DecodeError, EdgeTracker};
use crate::mapping::{KeyDispatcher, KeyMap, KeySink, MappingTable};
use statum::{machine, state};
use tracing::{debug, info, warn};

#[state]
#[derive(Debug, Clone)]
pub enum SessionPhase {
    Disconnected,
    Connected,
}

#[machine]
pub struct DeviceSession<S: SessionPhase> {
    tracker: EdgeTracker,
    dispatcher: KeyDispatcher,
    mapping: MappingTable,
    observer: Box<dyn StatusObserver>,
}

/// What happened to a single report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Decoded and dispatched
    Processed { transitions: usize },
    /// Rejected by the decoder; no state changed
    Dropped(DecodeError),
    /// Arrived while no device is connected
    Ignored,
}

impl<S: SessionPhase> DeviceSession<S> {
    /// Buttons the edge tracker currently considers pressed
    pub fn pressed(&self) -> ButtonSet {
        self.tracker.pressed()
    }

    pub fn dispatcher(&self) -> &KeyDispatcher {
        &self.dispatcher
    }

    /// Swaps the mapping; held keys keep the action they were pressed with
    pub fn mapping_changed(&self, map: KeyMap) {
        self.mapping.replace(map);
    }

    fn notify(&mut self, status: DeviceStatus) {
        self.observer.status_changed(status);
    }
}

impl DeviceSession<Disconnected> {
    pub fn create(
        mapping: MappingTable,
        sink: Box<dyn KeySink>,
        observer: Box<dyn StatusObserver>,
    ) -> Self {
        debug!("Creating device session");
        Self::new(
            EdgeTracker::new(),
            KeyDispatcher::new(sink),
            mapping,
            observer,
        )
    }

    pub fn connect(mut self) -> DeviceSession<Connected> {
        info!("Gamepad connected");
        self.notify(DeviceStatus::connected(ButtonSet::empty()));
        self.transition()
    }
}

impl DeviceSession<Connected> {
    /// Runs one report through decoder → edge tracker → dispatcher.
    ///
    /// A report that fails to decode is dropped before it reaches the edge
    /// tracker, and observers are not notified.
    pub fn process_report(&mut self, report: &[u8]) -> ReportOutcome {
        let active = match decode_report(report) {
            Ok(active) => active,
            Err(e) => {
                warn!("Dropping report: {}", e);
                return ReportOutcome::Dropped(e);
            }
        };

        let transitions = self.tracker.track(active);
        // One snapshot per report, so a concurrent replace can't split it
        let map = self.mapping.snapshot();
        self.dispatcher.dispatch(&transitions, &map);

        self.notify(DeviceStatus::connected(active));
        ReportOutcome::Processed {
            transitions: transitions.len(),
        }
    }

    /// Releases every held key, clears button state and notifies observers
    pub fn disconnect(mut self) -> DeviceSession<Disconnected> {
        let releases = self.tracker.reset();
        let map = self.mapping.snapshot();
        self.dispatcher.dispatch(&releases, &map);

        let leftover = self.dispatcher.release_all();
        if leftover > 0 {
            warn!("Force released {} keys with no pressed button", leftover);
        }

        info!("Gamepad disconnected");
        self.notify(DeviceStatus::disconnected());
        self.transition()
    }
}

enum Slot {
    Disconnected(DeviceSession<Disconnected>),
    Connected(DeviceSession<Connected>),
}

/// Runtime front end for [`DeviceSession`]
///
/// Not shareable across threads by design: all lifecycle calls must come from
/// one owner, see [`crate::session::SessionHandle`] for the task-based owner.
pub struct SessionController {
    slot: Option<Slot>,
    mapping: MappingTable,
}

impl SessionController {
    pub fn new(
        initial: KeyMap,
        sink: Box<dyn KeySink>,
        observer: Box<dyn StatusObserver>,
    ) -> Self {
        Self::with_table(MappingTable::new(initial), sink, observer)
    }

    /// Uses an existing table so other threads can replace mappings directly
    pub fn with_table(
        mapping: MappingTable,
        sink: Box<dyn KeySink>,
        observer: Box<dyn StatusObserver>,
    ) -> Self {
        let session = DeviceSession::create(mapping.clone(), sink, observer);
        Self {
            slot: Some(Slot::Disconnected(session)),
            mapping,
        }
    }

    pub fn connect(&mut self) {
        if self.is_connected() {
            warn!("Connect while already connected, restarting session");
            self.disconnect();
        }
        self.advance(|slot| match slot {
            Slot::Disconnected(session) => Slot::Connected(session.connect()),
            connected => connected,
        });
    }

    pub fn report_arrived(&mut self, report: &[u8]) -> ReportOutcome {
        match self.slot.as_mut() {
            Some(Slot::Connected(session)) => session.process_report(report),
            _ => {
                debug!("Ignoring report of {} bytes while disconnected", report.len());
                ReportOutcome::Ignored
            }
        }
    }

    pub fn disconnect(&mut self) {
        if !self.is_connected() {
            debug!("Disconnect while already disconnected");
            return;
        }
        self.advance(|slot| match slot {
            Slot::Connected(session) => Slot::Disconnected(session.disconnect()),
            disconnected => disconnected,
        });
    }

    pub fn mapping_changed(&self, map: KeyMap) {
        self.mapping.replace(map);
    }

    /// Handle to the live table, for writers on other threads
    pub fn mapping_table(&self) -> MappingTable {
        self.mapping.clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.slot, Some(Slot::Connected(_)))
    }

    pub fn pressed(&self) -> ButtonSet {
        match &self.slot {
            Some(Slot::Connected(session)) => session.pressed(),
            Some(Slot::Disconnected(session)) => session.pressed(),
            None => ButtonSet::empty(),
        }
    }

    /// True while any key-down is waiting for its key-up
    pub fn has_held_keys(&self) -> bool {
        match &self.slot {
            Some(Slot::Connected(session)) => session.dispatcher().has_held_keys(),
            Some(Slot::Disconnected(session)) => session.dispatcher().has_held_keys(),
            None => false,
        }
    }

    fn advance(&mut self, step: impl FnOnce(Slot) -> Slot) {
        if let Some(slot) = self.slot.take() {
            self.slot = Some(step(slot));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::LogicalButton;
    use crate::mapping::{ChannelKeySink, KeyAction, KeyEvent, ModifierFlags};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct RecordingObserver {
        seen: Arc<Mutex<Vec<DeviceStatus>>>,
    }

    impl RecordingObserver {
        fn statuses(&self) -> Vec<DeviceStatus> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl StatusObserver for RecordingObserver {
        fn status_changed(&mut self, status: DeviceStatus) {
            self.seen.lock().unwrap().push(status);
        }
    }

    fn escape() -> KeyAction {
        KeyAction::new(0x35, ModifierFlags::NONE, "Escape")
    }

    fn report(byte1: u8) -> [u8; 8] {
        [0x00, byte1, 0x00, 0x00, 0x00, 0x80, 0x00, 0x80]
    }

    fn controller(
        map: KeyMap,
    ) -> (SessionController, mpsc::UnboundedReceiver<KeyEvent>, RecordingObserver) {
        let (sink, rx) = ChannelKeySink::channel();
        let observer = RecordingObserver::default();
        let controller = SessionController::new(map, Box::new(sink), Box::new(observer.clone()));
        (controller, rx, observer)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<KeyEvent>) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn connect_notifies_empty_status() {
        let (mut controller, _rx, observer) = controller(KeyMap::unmapped());
        assert!(!controller.is_connected());
        controller.connect();
        assert!(controller.is_connected());
        assert_eq!(
            observer.statuses(),
            vec![DeviceStatus::connected(ButtonSet::empty())]
        );
    }

    #[test]
    fn report_while_disconnected_is_ignored() {
        let (mut controller, mut rx, observer) = controller(KeyMap::defaults());
        assert_eq!(controller.report_arrived(&report(0x40)), ReportOutcome::Ignored);
        assert!(drain(&mut rx).is_empty());
        assert!(observer.statuses().is_empty());
        assert!(controller.pressed().is_empty());
    }

    #[test]
    fn every_report_notifies_level_status() {
        let (mut controller, _rx, observer) = controller(KeyMap::unmapped());
        controller.connect();
        controller.report_arrived(&report(0x01));
        controller.report_arrived(&report(0x01));

        let statuses = observer.statuses();
        assert_eq!(statuses.len(), 3);
        let b: ButtonSet = [LogicalButton::B].into_iter().collect();
        assert_eq!(statuses[1], DeviceStatus::connected(b));
        assert_eq!(statuses[2], DeviceStatus::connected(b));
    }

    #[test]
    fn short_report_changes_nothing() {
        let (mut controller, mut rx, observer) = controller(KeyMap::defaults());
        controller.connect();
        controller.report_arrived(&report(0x40));
        let pressed = controller.pressed();
        drain(&mut rx);

        let outcome = controller.report_arrived(&[0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            outcome,
            ReportOutcome::Dropped(DecodeError::ShortReport { len: 5, min: 8 })
        );
        assert_eq!(controller.pressed(), pressed);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(observer.statuses().len(), 2);
    }

    #[test]
    fn disconnect_releases_held_key() {
        let map = KeyMap::unmapped().with(LogicalButton::ZL, escape());
        let (mut controller, mut rx, observer) = controller(map);
        controller.connect();
        controller.report_arrived(&report(0x40));
        assert!(controller.has_held_keys());

        controller.disconnect();

        assert_eq!(
            drain(&mut rx),
            vec![KeyEvent::down(&escape()), KeyEvent::up(&escape())]
        );
        assert!(!controller.has_held_keys());
        assert!(controller.pressed().is_empty());
        assert_eq!(observer.statuses().last(), Some(&DeviceStatus::disconnected()));
    }

    #[test]
    fn disconnect_twice_is_harmless() {
        let (mut controller, mut rx, observer) = controller(KeyMap::defaults());
        controller.connect();
        controller.disconnect();
        controller.disconnect();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(observer.statuses().len(), 2);
    }

    #[test]
    fn reconnect_starts_from_clean_state() {
        let map = KeyMap::unmapped().with(LogicalButton::ZL, escape());
        let (mut controller, mut rx, _observer) = controller(map);
        controller.connect();
        controller.report_arrived(&report(0x40));
        controller.disconnect();
        controller.connect();
        controller.report_arrived(&report(0x40));

        let downs = drain(&mut rx).iter().filter(|e| e.is_down).count();
        assert_eq!(downs, 2);
    }

    #[test]
    fn connect_while_connected_flushes_first() {
        let map = KeyMap::unmapped().with(LogicalButton::ZL, escape());
        let (mut controller, mut rx, observer) = controller(map);
        controller.connect();
        controller.report_arrived(&report(0x40));
        controller.connect();

        assert!(controller.is_connected());
        assert!(!controller.has_held_keys());
        assert_eq!(drain(&mut rx).last(), Some(&KeyEvent::up(&escape())));
        assert_eq!(
            observer.statuses().last(),
            Some(&DeviceStatus::connected(ButtonSet::empty()))
        );
    }

    #[test]
    fn lagging_injector_still_gets_release_on_disconnect() {
        let map = KeyMap::unmapped().with(LogicalButton::ZL, escape());
        let (mut controller, mut rx, _observer) = controller(map);
        controller.connect();
        for _ in 0..32 {
            controller.report_arrived(&report(0x40));
            controller.report_arrived(&report(0x00));
        }
        controller.report_arrived(&report(0x40));
        controller.disconnect();
        assert!(!controller.has_held_keys());

        let events = drain(&mut rx);
        let downs = events.iter().filter(|e| e.is_down).count();
        assert_eq!(downs, 33);
        assert_eq!(events.len() - downs, downs);
        assert_eq!(events.last(), Some(&KeyEvent::up(&escape())));
    }

    #[test]
    fn mapping_change_does_not_touch_state() {
        let map = KeyMap::unmapped().with(LogicalButton::ZL, escape());
        let (mut controller, mut rx, _observer) = controller(map);
        controller.connect();
        controller.report_arrived(&report(0x40));

        let enter = KeyAction::new(0x24, ModifierFlags::NONE, "Enter");
        controller.mapping_changed(KeyMap::unmapped().with(LogicalButton::ZL, enter.clone()));
        assert!(controller.has_held_keys());
        assert_eq!(controller.mapping_table().lookup(LogicalButton::ZL), enter);

        controller.report_arrived(&report(0x00));
        assert_eq!(drain(&mut rx).last(), Some(&KeyEvent::up(&escape())));
    }
}
