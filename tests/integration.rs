use padbridge::controller::{EdgeKind, Transition};
use padbridge::mapping::{KeyAction, KeyEvent, KeyMap, KeySink, ModifierFlags, PresetAction};
use padbridge::persistence::MappingStore;
use padbridge::session::{
    DeviceEvent, DeviceStatus, ReportOutcome, SessionController, SessionHandle, StatusObserver,
};
use padbridge::{decode_report, ButtonSet, DecodeError, EdgeTracker, LogicalButton};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<KeyEvent>>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<KeyEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl KeySink for RecordingSink {
    fn emit(&mut self, event: KeyEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Clone, Default)]
struct RecordingObserver {
    seen: Arc<Mutex<Vec<DeviceStatus>>>,
}

impl StatusObserver for RecordingObserver {
    fn status_changed(&mut self, status: DeviceStatus) {
        self.seen.lock().unwrap().push(status);
    }
}

fn report(byte1: u8, byte2: u8, byte5: u8, byte7: u8) -> [u8; 8] {
    [0x00, byte1, byte2, 0x00, 0x00, byte5, 0x00, byte7]
}

fn buttons(byte1: u8) -> [u8; 8] {
    report(byte1, 0x00, 0x80, 0x80)
}

fn escape() -> KeyAction {
    KeyAction::new(0x35, ModifierFlags::NONE, "Escape")
}

fn session(map: KeyMap) -> (SessionController, RecordingSink, RecordingObserver) {
    let sink = RecordingSink::default();
    let observer = RecordingObserver::default();
    let controller = SessionController::new(map, Box::new(sink.clone()), Box::new(observer.clone()));
    (controller, sink, observer)
}

#[test]
fn b_press_with_no_mapping_emits_nothing() {
    let active = decode_report(&buttons(0x01)).unwrap();
    assert_eq!(active.iter().collect::<Vec<_>>(), vec![LogicalButton::B]);

    let mut tracker = EdgeTracker::new();
    assert_eq!(
        tracker.track(active),
        vec![Transition::pressed(LogicalButton::B)]
    );

    let (mut controller, sink, _) = session(KeyMap::unmapped());
    controller.connect();
    controller.report_arrived(&buttons(0x01));
    assert!(sink.take().is_empty());
    assert!(!controller.has_held_keys());
}

#[test]
fn repeated_report_yields_no_transitions() {
    let mut tracker = EdgeTracker::new();
    let active = decode_report(&buttons(0x01)).unwrap();
    assert_eq!(tracker.track(active).len(), 1);
    assert!(tracker.track(active).is_empty());

    let (mut controller, _, _) = session(KeyMap::unmapped());
    controller.connect();
    controller.report_arrived(&buttons(0x01));
    assert_eq!(
        controller.report_arrived(&buttons(0x01)),
        ReportOutcome::Processed { transitions: 0 }
    );
}

#[test]
fn release_after_press() {
    let mut tracker = EdgeTracker::new();
    tracker.track(decode_report(&buttons(0x01)).unwrap());
    let transitions = tracker.track(decode_report(&buttons(0x00)).unwrap());
    assert_eq!(transitions, vec![Transition::released(LogicalButton::B)]);
    assert_eq!(transitions[0].kind, EdgeKind::Released);
}

#[test]
fn dpad_horizontal_thresholds() {
    let left = decode_report(&report(0, 0, 0x20, 0x80)).unwrap();
    assert!(left.contains(LogicalButton::DPadLeft));
    assert!(!left.contains(LogicalButton::DPadRight));

    let right = decode_report(&report(0, 0, 0xE0, 0x80)).unwrap();
    assert!(right.contains(LogicalButton::DPadRight));
    assert!(!right.contains(LogicalButton::DPadLeft));

    for value in 0..=u8::MAX {
        let active = decode_report(&report(0, 0, value, 0x80)).unwrap();
        assert!(
            !(active.contains(LogicalButton::DPadLeft) && active.contains(LogicalButton::DPadRight)),
            "byte5 = {value:#04x}"
        );
    }
}

#[test]
fn disconnect_releases_escape_exactly_once() {
    let (mut controller, sink, observer) =
        session(KeyMap::unmapped().with(LogicalButton::ZL, escape()));
    controller.connect();
    controller.report_arrived(&buttons(0x40));

    let pressed = sink.take();
    assert_eq!(pressed.len(), 1);
    assert!(pressed[0].is_down);
    assert_eq!(pressed[0].key_code, 0x35);

    controller.disconnect();
    let released = sink.take();
    assert_eq!(released, vec![KeyEvent::up(&escape())]);
    assert_eq!(
        observer.seen.lock().unwrap().last(),
        Some(&DeviceStatus::disconnected())
    );
}

#[test]
fn short_report_leaves_state_unchanged() {
    assert_eq!(
        decode_report(&[0u8; 5]),
        Err(DecodeError::ShortReport { len: 5, min: 8 })
    );

    let (mut controller, sink, observer) = session(KeyMap::defaults());
    controller.connect();
    controller.report_arrived(&buttons(0x80));
    let before = controller.pressed();
    let notified = observer.seen.lock().unwrap().len();
    sink.take();

    assert!(matches!(
        controller.report_arrived(&[0u8; 5]),
        ReportOutcome::Dropped(DecodeError::ShortReport { .. })
    ));
    assert_eq!(controller.pressed(), before);
    assert!(sink.take().is_empty());
    assert_eq!(observer.seen.lock().unwrap().len(), notified);
}

#[test]
fn every_key_down_has_a_key_up_after_disconnect() {
    let map: KeyMap = LogicalButton::ALL
        .into_iter()
        .enumerate()
        .map(|(i, button)| (button, KeyAction::new(i as u16 + 1, ModifierFlags::NONE, "")))
        .collect();
    let (mut controller, sink, _) = session(map);
    controller.connect();

    let reports = [
        report(0xFF, 0x33, 0x20, 0xE0),
        report(0x0F, 0x00, 0x80, 0x80),
        report(0xF0, 0x10, 0xE0, 0x20),
        report(0x01, 0x02, 0x80, 0xE0),
    ];
    for r in &reports {
        controller.report_arrived(r);
    }
    controller.disconnect();

    let mut balance: HashMap<u16, i32> = HashMap::new();
    for event in sink.take() {
        *balance.entry(event.key_code).or_default() += if event.is_down { 1 } else { -1 };
    }
    assert!(balance.values().all(|&n| n == 0), "{balance:?}");
    assert!(!controller.has_held_keys());
}

#[test]
fn transitions_follow_catalog_order() {
    let mut tracker = EdgeTracker::new();
    // Capture, D-Up, ZR and B at once, spread over bytes 1, 2 and 7
    let active = decode_report(&report(0x81, 0x20, 0x80, 0x20)).unwrap();
    let order: Vec<LogicalButton> = tracker.track(active).iter().map(|t| t.button).collect();
    assert_eq!(
        order,
        vec![
            LogicalButton::B,
            LogicalButton::ZR,
            LogicalButton::DPadUp,
            LogicalButton::Capture
        ]
    );
}

#[test]
fn held_button_is_pressed_once() {
    let (mut controller, sink, _) = session(KeyMap::defaults());
    controller.connect();
    controller.report_arrived(&buttons(0x80));
    controller.report_arrived(&buttons(0x80));
    controller.report_arrived(&buttons(0x80));

    let downs = sink.take().into_iter().filter(|e| e.is_down).count();
    assert_eq!(downs, 1);
}

#[test]
fn remapping_while_held_keeps_release_action() {
    let (mut controller, sink, _) = session(KeyMap::defaults());
    controller.connect();
    // Hold ZL (Escape by default)
    controller.report_arrived(&buttons(0x40));

    let remapped = KeyMap::defaults()
        .with(LogicalButton::ZL, PresetAction::Tab.key_action())
        .with(LogicalButton::B, PresetAction::CmdZ.key_action());
    controller.mapping_changed(remapped);
    controller.report_arrived(&buttons(0x00));

    let events = sink.take();
    let escape = PresetAction::Escape.key_action();
    assert_eq!(events, vec![KeyEvent::down(&escape), KeyEvent::up(&escape)]);
}

#[test]
fn status_reports_level_not_edges() {
    let (mut controller, _, observer) = session(KeyMap::unmapped());
    controller.connect();
    controller.report_arrived(&buttons(0x02));
    controller.report_arrived(&buttons(0x02));

    let a: ButtonSet = [LogicalButton::A].into_iter().collect();
    let seen = observer.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            DeviceStatus::connected(ButtonSet::empty()),
            DeviceStatus::connected(a),
            DeviceStatus::connected(a),
        ]
    );
}

#[tokio::test]
async fn store_edits_reach_running_session() {
    let store = MappingStore::new(KeyMap::unmapped());
    let sink = RecordingSink::default();
    let controller = SessionController::new(
        KeyMap::unmapped(),
        Box::new(sink.clone()),
        Box::new(RecordingObserver::default()),
    );
    let table = controller.mapping_table();
    let handle = SessionHandle::spawn(controller, store.subscribe());
    let events = handle.sender();

    store.apply_preset(LogicalButton::ZL, PresetAction::Escape);
    // Wait until the session has applied the edit before pressing
    while table.lookup(LogicalButton::ZL).is_none() {
        tokio::task::yield_now().await;
    }

    events.send(DeviceEvent::Connected).await.unwrap();
    events.send(DeviceEvent::Report(buttons(0x40).to_vec())).await.unwrap();
    let controller = handle.shutdown().await.unwrap();

    assert!(!controller.is_connected());
    let escape = PresetAction::Escape.key_action();
    assert_eq!(sink.take(), vec![KeyEvent::down(&escape), KeyEvent::up(&escape)]);
}
