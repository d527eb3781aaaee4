//! Integration tests for observable bindings
//!
//! These tests verify that:
//! - Bound attributes follow their sources synchronously
//! - Combining callbacks see source values in registration order
//! - Unbinding prunes the bookkeeping and the source subscriptions
//! - Bindings compose with state machines and debounced signals

use lumen_core::{
    Debouncer, ManualClock, Observable, StateMachine, TimerQueue, Value,
};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Bookkeeping after a series of partial unbinds
#[test]
fn test_unbind_prunes_structure() {
    let model = Observable::new();
    let bound1 = Observable::with_attributes([("b1a", Value::from("foo"))]);
    let bound2 = Observable::with_attributes([
        ("b2b", Value::from(42)),
        ("b2c", Value::from("bar")),
    ]);
    let bound3 = Observable::with_attributes([("b3d", Value::from("baz"))]);

    model.bind(&["a"]).unwrap().to(&bound1, &["b1a"]).unwrap();
    model
        .bind(&["b", "c"])
        .unwrap()
        .to(&bound2, &["b2b", "b2c"])
        .unwrap();
    model
        .bind(&["d", "e"])
        .unwrap()
        .to(&bound3, &["b3d", "b3d"])
        .unwrap();

    assert_eq!(model.bound_attributes(), names(&["a", "b", "c", "d", "e"]));
    assert_eq!(
        model.bound_sources(),
        vec![bound1.id(), bound2.id(), bound3.id()]
    );
    assert_eq!(model.bindings_to(&bound3)["b3d"], names(&["d", "e"]));

    model.unbind(&["c", "d"]).unwrap();
    assert_eq!(model.bound_attributes(), names(&["a", "b", "e"]));
    assert_eq!(model.bindings_to(&bound2).len(), 1);
    assert_eq!(model.bindings_to(&bound2)["b2b"], names(&["b"]));
    assert_eq!(model.bindings_to(&bound3)["b3d"], names(&["e"]));

    model.unbind(&["b"]).unwrap();
    assert_eq!(model.bound_sources(), vec![bound1.id(), bound3.id()]);
    assert!(!model.is_listening_to(bound2.id()));
    assert!(model.is_listening_to(bound3.id()));

    model.unbind(&[]).unwrap();
    assert!(model.bound_attributes().is_empty());
    assert!(model.bound_sources().is_empty());
    assert!(!model.is_listening_to(bound1.id()));
}

/// Partial unbind leaves the remaining attribute live
#[test]
fn test_unbind_some_attributes() {
    let car = Observable::with_attributes([
        ("color", Value::from("red")),
        ("year", Value::from(2000)),
        ("torque", Value::from(160)),
    ]);
    let vehicle = Observable::new();

    vehicle
        .bind(&["color", "year", "torque"])
        .unwrap()
        .to(&car, &[])
        .unwrap();
    vehicle.unbind(&["year", "torque"]).unwrap();

    car.set("color", "blue").unwrap();
    car.set("year", 1969).unwrap();
    car.set("torque", 220).unwrap();

    assert_eq!(vehicle.get("color"), Value::from("blue"));
    assert_eq!(vehicle.get("year"), Value::from(2000));
    assert_eq!(vehicle.get("torque"), Value::from(160));
}

/// Unbinding a combined attribute freezes the combined value
#[test]
fn test_unbind_combined_attribute() {
    let vehicle = Observable::new();
    let car1 = Observable::with_attributes([("color", Value::from("red"))]);
    let car2 = Observable::with_attributes([("color", Value::from("blue"))]);

    vehicle
        .bind(&["color"])
        .unwrap()
        .to(&car1, &[])
        .unwrap()
        .to(&car2, &[])
        .unwrap()
        .as_fn(|v| Value::from(format!("{}{}", v[0].to_text(), v[1].to_text())))
        .unwrap();
    assert_eq!(vehicle.get("color"), Value::from("redblue"));

    vehicle.unbind(&["color"]).unwrap();
    car1.set("color", "green").unwrap();
    car2.set("color", "violet").unwrap();
    assert_eq!(vehicle.get("color"), Value::from("redblue"));
}

/// A bound attribute may itself be a source for a third model
#[test]
fn test_binding_chains_across_models() {
    let source = Observable::with_attributes([("label", Value::from("Bold"))]);
    let middle = Observable::new();
    let leaf = Observable::new();

    middle.bind(&["label"]).unwrap().to(&source, &[]).unwrap();
    leaf.bind(&["text"]).unwrap().to(&middle, &["label"]).unwrap();

    let changes = Rc::new(Cell::new(0));
    let changes_clone = changes.clone();
    leaf.on("change:text", move |_, _| changes_clone.set(changes_clone.get() + 1));

    source.set("label", "Italic").unwrap();
    assert_eq!(leaf.get("text"), Value::from("Italic"));
    assert_eq!(changes.get(), 1);

    // Same value again: nothing propagates.
    source.set("label", "Italic").unwrap();
    assert_eq!(changes.get(), 1);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Panel {
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum PanelEvent {
    Settled,
}

/// Debounced attribute changes drive a state machine transition
#[test]
fn test_debounced_change_drives_fsm() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let clock = Rc::new(ManualClock::new());
    let timers = TimerQueue::new(clock.clone());
    let model = Observable::with_attributes([("query", Value::from(""))]);

    let fsm = Rc::new(std::cell::RefCell::new(
        StateMachine::builder(Panel::Closed)
            .on(Panel::Closed, PanelEvent::Settled, Panel::Open)
            .build(),
    ));

    let fsm_clone = fsm.clone();
    let debouncer = Debouncer::new(&timers, Duration::from_millis(200), move || {
        fsm_clone.borrow_mut().send(PanelEvent::Settled);
    });

    let debouncer_clone = debouncer.clone();
    model.on("change:query", move |_, _| debouncer_clone.call());

    model.set("query", "a").unwrap();
    clock.advance(Duration::from_millis(150));
    timers.run_due();
    model.set("query", "ab").unwrap();
    clock.advance(Duration::from_millis(150));
    timers.run_due();
    assert!(fsm.borrow().is_in(Panel::Closed));

    clock.advance(Duration::from_millis(50));
    timers.run_due();
    assert!(fsm.borrow().is_in(Panel::Open));
}
