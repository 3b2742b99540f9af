//! Complete counter application demonstrating all features together

use std::sync::Arc;

use serde_json::{json, Value};
use unistore::{connect_store, distinct_selector, ActionCreators, Provider, Store};

#[derive(Clone, Debug)]
struct CounterState {
    count: Arc<i64>,
    step: i64,
    history: Arc<Vec<i64>>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            count: Arc::new(0),
            step: 1,
            history: Arc::new(vec![0]),
        }
    }

    fn moved_to(&self, count: i64) -> Arc<Self> {
        let mut history = self.history.as_ref().clone();
        history.push(count);
        Arc::new(Self {
            count: Arc::new(count),
            step: self.step,
            history: Arc::new(history),
        })
    }
}

fn reduce(state: &Arc<CounterState>, action: &Value) -> Arc<CounterState> {
    match action["type"].as_str() {
        Some("increment") => state.moved_to(*state.count + state.step),
        Some("decrement") => state.moved_to(*state.count - state.step),
        Some("reset") => state.moved_to(0),
        Some("set_step") => match action["step"].as_i64() {
            Some(step) if step != state.step => Arc::new(CounterState {
                step,
                ..state.as_ref().clone()
            }),
            _ => Arc::clone(state),
        },
        _ => Arc::clone(state),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Complete Counter Application ===\n");

    println!("1. Initializing counter store");
    let store = Store::builder(reduce, CounterState::new())
        .name("counter")
        .build();
    let provider = Provider::new(store);

    println!("\n2. Connecting a display to the count only");
    let display = connect_store(
        provider.store(),
        distinct_selector(|state: &Arc<CounterState>| Arc::clone(&state.count)),
        |count| println!("   [Display] Count: {}", count),
    );

    println!("\n3. Binding actions");
    let actions = provider.with_actions(
        ActionCreators::new()
            .with("increment", |_: Option<i64>| json!({ "type": "increment" }))
            .with("decrement", |_: Option<i64>| json!({ "type": "decrement" }))
            .with("reset", |_: Option<i64>| json!({ "type": "reset" }))
            .with("set_step", |step: Option<i64>| json!({ "type": "set_step", "step": step })),
    );

    println!("\n4. Performing operations");
    for (name, args) in [
        ("increment", None),
        ("increment", None),
        ("set_step", Some(5)),
        ("increment", None),
        ("decrement", None),
        ("set_step", Some(5)),
        ("reset", None),
    ] {
        println!("   -> {name}({args:?})");
        if let Err(err) = actions.call(name, args).and_then(|dispatched| dispatched) {
            eprintln!("   dispatch failed: {err}");
        }
    }

    println!("\n5. Final state");
    let state = provider.store().get_state();
    println!("   Count: {}", state.count);
    println!("   Step: {}", state.step);
    println!("   History: {:?}", state.history);
    println!("   Display shows: {}", display.current());

    println!("\n=== Application Complete ===");
}
