use std::cell::RefCell;
use std::rc::Rc;

use etransit_core::{
    on_complete, properties, Callback, CssValue, ElementId, MemoryHost, QueueState, StepCount,
    StepKind, StyleHost, Timing, Transit, TransitError, TransitEvent, Watcher,
};

type Log = Rc<RefCell<Vec<String>>>;

fn setup(use_transition_end: bool) -> (Transit<MemoryHost>, ElementId) {
    let mut host = MemoryHost::new();
    let el = host.create_element(Some("box"));
    host.set_style(el, "opacity", "1");
    let mut transit = Transit::new(host);
    transit.config_mut().use_transition_end = use_transition_end;
    (transit, el)
}

fn note(log: &Log, tag: &str) -> Option<Callback> {
    let log = log.clone();
    let tag = tag.to_string();
    on_complete(move |_| log.borrow_mut().push(tag))
}

fn opacity(value: f64) -> etransit_core::Properties {
    properties([("opacity", CssValue::from(value))])
}

#[test]
fn queued_steps_complete_in_order_without_overlap() {
    let (mut t, el) = setup(false);
    let log = Log::default();

    t.get(el)
        .unwrap()
        .transit(opacity(0.5), 100.0, "ease", note(&log, "A"))
        .then(opacity(0.2), 100.0, "ease", note(&log, "B"))
        .then(properties([("width", 50.into())]), 100.0, "ease", note(&log, "C"));

    assert_eq!(t.host().inline(el, "opacity"), Some("0.5"));
    assert_eq!(t.host().inline(el, "width"), None);
    assert_eq!(t.queue_state(el), QueueState::StepActive);

    t.update(99.0);
    assert!(log.borrow().is_empty());
    assert_eq!(t.host().inline(el, "opacity"), Some("0.5"));

    t.update(1.0);
    assert_eq!(*log.borrow(), vec!["A"]);
    assert_eq!(t.host().inline(el, "opacity"), Some("0.2"));
    assert_eq!(t.host().inline(el, "width"), None);

    t.update(100.0);
    t.update(100.0);
    assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
    assert_eq!(t.host().inline(el, "width"), Some("50px"));
    assert_eq!(t.queue_state(el), QueueState::Empty);
    assert_eq!(t.history_len(el), 3);
}

#[test]
fn one_update_can_drain_several_timers() {
    let (mut t, el) = setup(false);
    let log = Log::default();
    t.transit(el, opacity(0.5), 100.0, "ease", note(&log, "A"));
    t.transit(el, opacity(0.2), 100.0, "ease", note(&log, "B"));
    t.update(250.0);
    assert_eq!(*log.borrow(), vec!["A", "B"]);
    assert_eq!(t.now(), 250.0);
}

#[test]
fn zero_duration_applies_synchronously_without_a_watcher() {
    let (mut t, el) = setup(true);
    let log = Log::default();
    t.transit(el, opacity(0.5), 0.0, "ease", note(&log, "Z"));

    assert_eq!(t.host().inline(el, "opacity"), Some("0.5"));
    assert_eq!(*log.borrow(), vec!["Z"]);
    assert_eq!(t.host().listener_count(el), 0);
    assert_eq!(t.host().inline(el, "transition"), None);

    let events = t.update(0.0).events.clone();
    assert!(events.iter().any(|e| matches!(
        e,
        TransitEvent::StepStarted {
            watcher: Watcher::Immediate,
            ..
        }
    )));
    assert_eq!(t.history_len(el), 1);
}

#[test]
fn transition_end_completes_only_for_watched_properties() {
    let (mut t, el) = setup(true);
    let log = Log::default();
    t.transit(el, opacity(0.5), 300.0, "ease", note(&log, "A"));

    assert!(t.host().is_listening(el, "transitionend"));
    assert_eq!(t.host().inline(el, "transition"), Some("opacity 300ms ease"));

    t.update(1000.0);
    assert!(log.borrow().is_empty(), "event-bound steps have no timer");

    assert!(t.host_mut().fire_transition_end(el, Some("width")));
    t.update(0.0);
    assert!(log.borrow().is_empty());

    t.host_mut().fire_transition_end(el, Some("opacity"));
    t.update(0.0);
    assert_eq!(*log.borrow(), vec!["A"]);
    assert!(!t.host().is_listening(el, "transitionend"));
    assert_eq!(t.host().inline(el, "transition"), None);
}

#[test]
fn ends_buffered_for_a_finished_step_do_not_complete_the_next() {
    let (mut t, el) = setup(true);
    let log = Log::default();
    t.get(el)
        .unwrap()
        .transit(
            properties([("opacity", 0.5.into()), ("width", 50.into())]),
            300.0,
            "ease",
            note(&log, "A"),
        )
        .then(properties([("width", 80.into())]), 300.0, "ease", note(&log, "B"));

    // Both of A's properties finish before the next tick.
    assert!(t.host_mut().fire_transition_end(el, Some("opacity")));
    assert!(t.host_mut().fire_transition_end(el, Some("width")));
    t.update(16.0);
    assert_eq!(*log.borrow(), vec!["A"]);
    assert_eq!(t.host().inline(el, "width"), Some("80px"));
    assert_eq!(t.queue_state(el), QueueState::StepActive);
    assert!(t.host().is_listening(el, "transitionend"));

    t.host_mut().fire_transition_end(el, Some("width"));
    t.update(16.0);
    assert_eq!(*log.borrow(), vec!["A", "B"]);
}

#[test]
fn longhand_ends_only_count_for_shorthands() {
    let (mut t, el) = setup(true);
    let log = Log::default();
    t.transit(el, properties([("rotate", 30.into())]), 200.0, "ease", note(&log, "spin"));
    t.transit(el, properties([("margin", 8.into())]), 200.0, "ease", note(&log, "margin"));

    t.host_mut().fire_transition_end(el, Some("transform-origin"));
    t.update(0.0);
    assert!(log.borrow().is_empty());

    t.host_mut().fire_transition_end(el, Some("transform"));
    t.update(0.0);
    assert_eq!(*log.borrow(), vec!["spin"]);

    t.host_mut().fire_transition_end(el, Some("margin-left"));
    t.update(0.0);
    assert_eq!(*log.borrow(), vec!["spin", "margin"]);
}

#[test]
fn disabled_config_applies_end_state_immediately() {
    let (mut t, el) = setup(false);
    t.config_mut().enabled = false;
    let log = Log::default();
    t.transit(el, opacity(0.3), 1000.0, "ease", note(&log, "off"));
    assert_eq!(t.host().inline(el, "opacity"), Some("0.3"));
    assert_eq!(*log.borrow(), vec!["off"]);
    assert_eq!(t.queue_state(el), QueueState::Empty);
}

#[test]
fn missing_transition_support_falls_back_to_immediate() {
    let mut host = MemoryHost::new();
    host.set_supported_properties(["opacity", "transform"]);
    let el = host.create_element(None);
    let mut t = Transit::new(host);
    assert!(t.support().transition.is_none());

    let log = Log::default();
    t.transit(el, opacity(0.4), 500.0, "ease", note(&log, "now"));
    assert_eq!(*log.borrow(), vec!["now"]);
}

#[test]
fn default_duration_comes_from_config() {
    let (mut t, el) = setup(false);
    t.config_mut().speeds.default = 250.0;
    let log = Log::default();
    t.transit(el, opacity(0.1), Timing::default(), "ease", note(&log, "d"));
    t.update(249.0);
    assert!(log.borrow().is_empty());
    t.update(1.0);
    assert_eq!(*log.borrow(), vec!["d"]);
}

#[test]
fn restore_returns_to_the_original_value() {
    let (mut t, el) = setup(false);
    let log = Log::default();
    t.transit(el, opacity(0.2), 300.0, "ease", None);
    t.update(300.0);
    assert_eq!(t.host().inline(el, "opacity"), Some("0.2"));
    assert_eq!(t.history_len(el), 1);

    t.get(el).unwrap().restore(note(&log, "restored"));
    assert_eq!(t.host().inline(el, "opacity"), Some("1"));
    t.update(1.0);

    assert_eq!(*log.borrow(), vec!["restored"]);
    assert_eq!(t.host().inline(el, "opacity"), Some("1"));
    assert_eq!(t.history_len(el), 0);
}

#[test]
fn reverse_undoes_the_newest_step() {
    let (mut t, el) = setup(false);
    let log = Log::default();
    t.transit(el, opacity(0.5), 100.0, "ease", None);
    t.transit(el, properties([("width", 50.into())]), 100.0, "ease", None);
    t.update(100.0);
    t.update(100.0);
    assert_eq!(t.history_len(el), 2);

    t.reverse(el, StepCount::from(1), note(&log, "rev"));
    assert_eq!(t.host().inline(el, "width"), None);
    t.update(100.0);

    assert_eq!(*log.borrow(), vec!["rev"]);
    assert_eq!(t.history_len(el), 1);
    assert_eq!(t.host().inline(el, "opacity"), Some("0.5"));
}

#[test]
fn repeat_alternates_reverse_and_forward() {
    let (mut t, el) = setup(false);
    t.transit(el, opacity(0.5), 100.0, "ease", None);
    t.update(100.0);

    t.get(el).unwrap().repeat(2, StepCount::All);
    let mut seen = Vec::new();
    let mut kinds = Vec::new();
    for _ in 0..5 {
        seen.push(t.host().inline(el, "opacity").map(str::to_string));
        for event in &t.update(100.0).events {
            if let TransitEvent::StepStarted { kind, .. } = event {
                kinds.push(*kind);
            }
        }
    }

    let seen: Vec<_> = seen.into_iter().flatten().collect();
    assert_eq!(seen, vec!["1", "0.5", "1", "0.5", "0.5"]);
    assert_eq!(
        kinds,
        vec![
            StepKind::Reverse,
            StepKind::Loop,
            StepKind::Reverse,
            StepKind::Loop
        ]
    );
    assert_eq!(t.queue_state(el), QueueState::Empty);
    assert_eq!(t.history_len(el), 1);
}

#[test]
fn restore_now_aborts_the_active_step_and_jumps_the_queue() {
    let (mut t, el) = setup(false);
    let log = Log::default();
    t.transit(el, opacity(0.2), 1000.0, "ease", note(&log, "a"));
    t.transit(el, properties([("width", 10.into())]), 100.0, "ease", note(&log, "b"));
    t.update(500.0);

    t.restore_now(el, note(&log, "r"));
    assert_eq!(*log.borrow(), vec!["a"]);
    assert_eq!(t.host().inline(el, "opacity"), Some("1"));

    t.update(1.0);
    assert_eq!(*log.borrow(), vec!["a", "r"]);
    assert_eq!(t.host().inline(el, "width"), Some("10px"));

    t.update(100.0);
    assert_eq!(*log.borrow(), vec!["a", "r", "b"]);
    assert_eq!(t.history_len(el), 1);
}

#[test]
fn restore_all_style_resets_inline_text() {
    let (mut t, el) = setup(false);
    let log = Log::default();
    t.transit(el, opacity(0.2), 100.0, "ease", None);
    t.transit(el, properties([("x", 50.into())]), 100.0, "ease", None);
    t.update(100.0);
    t.update(100.0);
    t.host_mut().set_style(el, "color", "red");
    assert!(t.transform_of(el).is_some());

    t.restore_all_style(el, note(&log, "clean"));
    t.update(1.0);

    assert_eq!(*log.borrow(), vec!["clean"]);
    assert_eq!(t.host().inline(el, "opacity"), Some("1"));
    assert_eq!(t.host().inline(el, "color"), None);
    assert_eq!(t.host().inline(el, "transform"), None);
    assert!(t.transform_of(el).is_none());
    assert_eq!(t.history_len(el), 0);
}

#[test]
fn targets_resolve_through_the_host() {
    let (mut t, el) = setup(false);
    let resolved = t
        .to("box", opacity(0.7), 0.0, "ease", None)
        .expect("box exists");
    assert_eq!(resolved, el);
    assert_eq!(t.host().inline(el, "opacity"), Some("0.7"));

    let err = t.get("missing").err().expect("lookup fails");
    assert_eq!(
        err,
        TransitError::ElementNotFound {
            id: "missing".into()
        }
    );
}

#[test]
fn forget_drops_element_state() {
    let (mut t, el) = setup(true);
    let log = Log::default();
    t.transit(el, opacity(0.2), 100.0, "ease", note(&log, "never"));
    assert!(t.host().is_listening(el, "transitionend"));

    t.forget(el);
    assert!(!t.host().is_listening(el, "transitionend"));
    assert_eq!(t.queue_state(el), QueueState::Empty);
    t.update(1000.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn transform_properties_share_one_composite() {
    let (mut t, el) = setup(false);
    t.transit(el, properties([("x", 10.into())]), 0.0, "ease", None);
    t.transit(el, properties([("y", 20.into())]), 0.0, "ease", None);
    t.transit(el, properties([("rotate", 45.into())]), 0.0, "ease", None);
    assert_eq!(
        t.host().inline(el, "transform"),
        Some("translate(10px,20px) rotate(45deg)")
    );
}

#[test]
fn webkit_hosts_get_prefixed_names() {
    let mut host = MemoryHost::new();
    host.set_supported_properties(["WebkitTransition", "WebkitTransform", "opacity"]);
    let el = host.create_element(None);
    let mut t = Transit::new(host);
    let log = Log::default();

    t.transit(el, properties([("x", 10.into())]), 200.0, "ease", note(&log, "w"));
    assert_eq!(t.host().inline(el, "WebkitTransform"), Some("translate3d(10px,0,0)"));
    assert_eq!(
        t.host().inline(el, "WebkitTransition"),
        Some("-webkit-transform 200ms ease")
    );
    assert!(t.host().is_listening(el, "webkitTransitionEnd"));

    t.host_mut().fire_transition_end(el, Some("-webkit-transform"));
    t.update(0.0);
    assert_eq!(*log.borrow(), vec!["w"]);
}
