//! Cart demo
//!
//! A cart store bound to a console "element": path bindings, a store-wide
//! observer, a mapped-state selector, and dispatches - including the
//! warning path for a missing action and the strict-mode write guard.
//!
//! Run with:
//! `cargo run -p resin_state --example cart`

use std::sync::Arc;

use resin_state::{
    ActionEnvelope, DisposerSet, Middleware, PathBinding, StateHub, StateObserver, StateTarget,
    StoreDef,
};
use serde_json::{json, Value};

/// Console-backed element: every applied property is printed.
struct ConsoleElement {
    name: &'static str,
}

impl StateTarget for ConsoleElement {
    fn set_property(&self, property: &str, value: Option<Value>) {
        match value {
            Some(value) => println!("[{}] {} = {}", self.name, property, value),
            None => println!("[{}] {} = <absent>", self.name, property),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let hub = StateHub::new();
    hub.combine([(
        "cart",
        StoreDef::new(json!({ "items": [], "total": 0 }))
            .action("add_item", |scope, payload| {
                let item = payload.cloned().unwrap_or(Value::Null);
                let price = item.get("price").and_then(Value::as_i64).unwrap_or(0);
                scope.update("items", |items| {
                    items.as_array_mut().expect("items sequence").push(item);
                });
                let total = scope.get("total").and_then(|t| t.as_i64()).unwrap_or(0) + price;
                scope.set("total", json!(total));
                Some(json!(total))
            })
            .action("clear", |scope, _| {
                scope.set("items", json!([]));
                scope.set("total", json!(0));
                None
            }),
    )]);

    let element = Arc::new(ConsoleElement { name: "cart-view" });
    let mut disposers = DisposerSet::new();

    disposers.extend(hub.bind_paths(
        element.clone(),
        vec![
            PathBinding::new("total", "cart", "total"),
            PathBinding::new("first_item", "cart", "items.0.name"),
        ],
    ));
    disposers.extend(hub.bind_observers(
        element.clone(),
        vec![StateObserver::new("cart", |element, snapshot| {
            let count = snapshot
                .and_then(|s| s.get("items"))
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            element.set_property("item_count", Some(json!(count)));
        })],
    ));
    disposers.extend(hub.bind_selector(element.clone(), |view| {
        let total = view.get("cart", "total").unwrap_or(json!(0));
        vec![("summary".to_string(), json!(format!("total: {}", total)))]
    }));

    let logger: Middleware = Arc::new(|_, envelope| {
        tracing::info!("dispatch {} -> {}", envelope.store, envelope.action);
    });
    let middlewares = vec![logger];

    hub.dispatch(
        &middlewares,
        ActionEnvelope::new("cart", "add_item").payload(json!({ "name": "apple", "price": 3 })),
    );
    hub.dispatch(
        &middlewares,
        ActionEnvelope::new("cart", "add_item").payload(json!({ "name": "pear", "price": 5 })),
    );

    // Missing action: warning, no panic, no state change.
    hub.dispatch(&middlewares, ActionEnvelope::new("cart", "does_not_exist"));

    // Strict mode (on by default) rejects writes that bypass actions.
    if let Err(error) = hub.set("cart", "total", json!(0)) {
        println!("rejected direct write: {}", error);
    }

    hub.dispatch(&middlewares, ActionEnvelope::new("cart", "clear"));

    // Detach: after disposal nothing reaches the element.
    disposers.dispose();
    hub.dispatch(
        &middlewares,
        ActionEnvelope::new("cart", "add_item").payload(json!({ "name": "plum", "price": 2 })),
    );
    println!("final state: {}", hub.get_state("cart").expect("cart store"));
}
