//! Integration tests for stores + bindings + dispatch
//!
//! These tests verify that:
//! - Path bindings push mutations into elements with fine granularity
//! - Observer and mapped-state bindings re-fire on the right changes
//! - Disposal detaches elements cleanly
//! - Dispatch, middleware, and strict mode behave end to end

use std::sync::{Arc, Mutex};

use resin_core::ReactiveGraph;
use resin_state::testing::RecordingTarget;
use resin_state::{
    ActionEnvelope, DisposerSet, Middleware, PathBinding, StateError, StateHub, StateObserver,
    StoreDef,
};
use serde_json::{json, Value};

fn cart_hub() -> StateHub {
    let hub = StateHub::new();
    hub.combine([(
        "cart",
        StoreDef::new(json!({
            "items": [],
            "total": 0,
            "meta": { "open": false },
            "profile": { "name": "ada" }
        }))
        .action("add_item", |scope, payload| {
            let item = payload.cloned().unwrap_or(Value::Null);
            scope.update("items", |items| {
                items.as_array_mut().expect("items sequence").push(item);
            });
            None
        })
        .action("set_total", |scope, payload| {
            scope.set("total", payload.cloned().unwrap_or(json!(0)));
            None
        })
        .action("open", |scope, _| {
            scope.set("meta.open", json!(true));
            None
        })
        .action("rename", |scope, payload| {
            scope.set("profile", payload.cloned().unwrap_or(Value::Null));
            None
        })
        .action("checkout", |scope, payload| {
            scope.set("total", payload.cloned().unwrap_or(json!(0)));
            scope.set("meta.open", json!(false));
            scope.update("items", |items| {
                items.as_array_mut().expect("items sequence").clear();
            });
            Some(json!("done"))
        }),
    )]);
    hub
}

/// Mutating a bound path through an action pushes the new value into the
/// element property.
#[test]
fn test_path_binding_tracks_action_mutations() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());
    let _disposers = hub.bind_paths(
        target.clone(),
        vec![PathBinding::new("total", "cart", "total")],
    );

    assert_eq!(target.last("total"), Some(Some(json!(0))));

    hub.dispatch(&[], ActionEnvelope::new("cart", "set_total").payload(json!(12)));
    assert_eq!(target.last("total"), Some(Some(json!(12))));
    assert_eq!(target.count_for("total"), 2);
}

/// Mutating an unrelated path does not re-trigger a binding.
#[test]
fn test_unrelated_path_does_not_retrigger() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());
    let _disposers = hub.bind_paths(
        target.clone(),
        vec![PathBinding::new("total", "cart", "total")],
    );

    hub.dispatch(&[], ActionEnvelope::new("cart", "open"));
    hub.dispatch(
        &[],
        ActionEnvelope::new("cart", "add_item").payload(json!({ "id": 1 })),
    );

    assert_eq!(target.count_for("total"), 1, "only the initial application");
}

/// A binding re-fires when something beneath its path changes - the value
/// it pushes is a deep snapshot, so deep changes are changes.
#[test]
fn test_binding_refires_on_change_below_its_path() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());
    let _disposers = hub.bind_paths(target.clone(), vec![PathBinding::new("meta", "cart", "meta")]);

    hub.dispatch(&[], ActionEnvelope::new("cart", "open"));
    assert_eq!(target.last("meta"), Some(Some(json!({ "open": true }))));
    assert_eq!(target.count_for("meta"), 2);
}

/// A binding re-fires when an ancestor of its path is replaced wholesale.
#[test]
fn test_binding_refires_on_ancestor_replacement() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());
    let _disposers = hub.bind_paths(
        target.clone(),
        vec![PathBinding::new("name", "cart", "profile.name")],
    );

    hub.dispatch(
        &[],
        ActionEnvelope::new("cart", "rename").payload(json!({ "name": "grace" })),
    );
    assert_eq!(target.last("name"), Some(Some(json!("grace"))));
}

/// A binding on a path that does not exist yet applies `None`, then picks
/// the value up once an action creates it.
#[test]
fn test_binding_on_absent_path_picks_up_creation() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());
    let _disposers = hub.bind_paths(
        target.clone(),
        vec![PathBinding::new("email", "cart", "profile.email")],
    );

    assert_eq!(target.last("email"), Some(None));

    hub.dispatch(
        &[],
        ActionEnvelope::new("cart", "rename").payload(json!({ "name": "ada", "email": "a@b" })),
    );
    assert_eq!(target.last("email"), Some(Some(json!("a@b"))));
}

/// Several writes inside one action re-run an affected binding once.
#[test]
fn test_action_batches_writes_into_one_rerun() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());
    let _disposers = hub.bind_observers(
        target.clone(),
        vec![StateObserver::new("cart", |target, value| {
            target.set_property("snapshot", value.cloned());
        })],
    );

    assert_eq!(target.count_for("snapshot"), 1);

    // checkout writes total, meta.open, and items
    let result = hub.dispatch(&[], ActionEnvelope::new("cart", "checkout").payload(json!(99)));
    assert_eq!(result, Some(json!("done")));
    assert_eq!(target.count_for("snapshot"), 2, "one re-run for three writes");
}

/// Disposing every binding detaches the element: later mutations neither
/// update it nor panic.
#[test]
fn test_disposed_bindings_stop_firing() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());

    let mut disposers = DisposerSet::new();
    disposers.extend(hub.bind_paths(
        target.clone(),
        vec![
            PathBinding::new("total", "cart", "total"),
            PathBinding::new("meta", "cart", "meta"),
        ],
    ));
    disposers.extend(hub.bind_observers(
        target.clone(),
        vec![StateObserver::new("cart", |target, value| {
            target.set_property("any", value.cloned());
        })],
    ));
    assert_eq!(disposers.len(), 3);

    target.clear();
    disposers.dispose();

    hub.dispatch(&[], ActionEnvelope::new("cart", "set_total").payload(json!(5)));
    hub.dispatch(&[], ActionEnvelope::new("cart", "open"));
    assert!(target.applied().is_empty());
}

/// Observer bindings with a path receive the value at that path; without a
/// path they receive the whole store snapshot and re-fire on any change.
#[test]
fn test_observer_binding_modes() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());

    let _disposers = hub.bind_observers(
        target.clone(),
        vec![
            StateObserver::new("cart", |target, value| {
                target.set_property("watched_total", value.cloned());
            })
            .at_path("total"),
            StateObserver::new("cart", |target, value| {
                target.set_property("store_wide", value.cloned());
            }),
        ],
    );

    assert_eq!(target.last("watched_total"), Some(Some(json!(0))));
    assert_eq!(target.count_for("store_wide"), 1);

    hub.dispatch(&[], ActionEnvelope::new("cart", "open"));
    assert_eq!(target.count_for("watched_total"), 1, "total untouched");
    assert_eq!(target.count_for("store_wide"), 2, "any change re-fires");

    hub.dispatch(&[], ActionEnvelope::new("cart", "set_total").payload(json!(3)));
    assert_eq!(target.last("watched_total"), Some(Some(json!(3))));
    let snapshot = target.last("store_wide").flatten().expect("snapshot value");
    assert_eq!(snapshot.get("total"), Some(&json!(3)));
}

/// A mapped-state selector runs as one computation and applies every
/// returned property on each relevant change.
#[test]
fn test_selector_binding_applies_mapped_props() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());

    let _disposers = hub.bind_selector(target.clone(), |view| {
        let count = view
            .get("cart", "items")
            .and_then(|items| items.as_array().map(Vec::len))
            .unwrap_or(0);
        let total = view.get("cart", "total").unwrap_or(json!(0));
        vec![
            ("item_count".to_string(), json!(count)),
            ("summary".to_string(), json!(format!("{} items, total {}", count, total))),
        ]
    });

    assert_eq!(target.last("item_count"), Some(Some(json!(0))));
    assert_eq!(target.last("summary"), Some(Some(json!("0 items, total 0"))));

    hub.dispatch(
        &[],
        ActionEnvelope::new("cart", "add_item").payload(json!({ "id": 1 })),
    );
    assert_eq!(target.last("item_count"), Some(Some(json!(1))));
    assert_eq!(target.count_for("item_count"), 2);

    // meta.open is not read by the selector
    hub.dispatch(&[], ActionEnvelope::new("cart", "open"));
    assert_eq!(target.count_for("item_count"), 2);
}

/// Dispatching a missing action returns `None` and leaves state untouched;
/// middlewares observe every dispatch in declaration order first.
#[test]
fn test_dispatch_misses_and_middleware_order() {
    let hub = cart_hub();
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let order = order.clone();
        Arc::new(move |_: &StateHub, _: &ActionEnvelope| order.lock().unwrap().push("first"))
            as Middleware
    };
    let second = {
        let order = order.clone();
        Arc::new(move |_: &StateHub, _: &ActionEnvelope| order.lock().unwrap().push("second"))
            as Middleware
    };

    assert_eq!(
        hub.dispatch(&[first, second], ActionEnvelope::new("cart", "does_not_exist")),
        None
    );
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(hub.get_state("cart").unwrap()["total"], json!(0));
}

/// A direct write while strict mode is on fails synchronously at the write
/// site; turning strict mode off makes the same write land and re-fire
/// bindings.
#[test]
fn test_strict_mode_guards_direct_writes() {
    let hub = cart_hub();
    let target = Arc::new(RecordingTarget::new());
    let _disposers = hub.bind_paths(
        target.clone(),
        vec![PathBinding::new("total", "cart", "total")],
    );

    assert!(matches!(
        hub.set("cart", "total", json!(50)),
        Err(StateError::IllegalMutation { .. })
    ));
    assert_eq!(target.count_for("total"), 1);

    hub.set_strict(false);
    hub.set("cart", "total", json!(50)).unwrap();
    assert_eq!(target.last("total"), Some(Some(json!(50))));
}

/// Hubs are independent contexts: the same store name in two hubs shares
/// nothing.
#[test]
fn test_hubs_are_independent() {
    let first = cart_hub();
    let second = cart_hub();

    first.dispatch(&[], ActionEnvelope::new("cart", "set_total").payload(json!(10)));

    assert_eq!(first.resolve("cart", "total"), Some(json!(10)));
    assert_eq!(second.resolve("cart", "total"), Some(json!(0)));
}

/// An observer may dispatch back into the hub from its callback; the
/// re-entrant dispatch runs to completion.
#[test]
fn test_observer_may_dispatch_reentrantly() {
    let hub = StateHub::new();
    hub.combine([(
        "flow",
        StoreDef::new(json!({ "trigger": false, "marked": false }))
            .action("fire", |scope, _| {
                scope.set("trigger", json!(true));
                None
            })
            .action("mark", |scope, _| {
                scope.set("marked", json!(true));
                None
            }),
    )]);

    let target = Arc::new(RecordingTarget::new());
    let reentrant = hub.clone();
    let _disposers = hub.bind_observers(
        target.clone(),
        vec![StateObserver::new("flow", move |_, value| {
            let triggered = value
                .and_then(|snapshot| snapshot.get("trigger"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let marked = value
                .and_then(|snapshot| snapshot.get("marked"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if triggered && !marked {
                reentrant.dispatch(&[], ActionEnvelope::new("flow", "mark"));
            }
        })],
    );

    hub.dispatch(&[], ActionEnvelope::new("flow", "fire"));
    assert_eq!(hub.resolve("flow", "marked"), Some(json!(true)));
}

/// The engine seam accepts a caller-supplied implementation.
#[test]
fn test_hub_over_injected_engine() {
    let hub = StateHub::with_engine(Box::new(ReactiveGraph::new()));
    hub.combine([(
        "counter",
        StoreDef::new(json!({ "value": 0 })).action("bump", |scope, _| {
            let next = scope
                .get("value")
                .and_then(|value| value.as_i64())
                .unwrap_or(0)
                + 1;
            scope.set("value", json!(next));
            Some(json!(next))
        }),
    )]);

    assert!(hub.strict(), "strict mode is on by default");
    assert_eq!(
        hub.dispatch(&[], ActionEnvelope::new("counter", "bump")),
        Some(json!(1))
    );
    assert_eq!(hub.resolve("counter", "value"), Some(json!(1)));
}
