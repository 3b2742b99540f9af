//! # Unistore
//!
//! A unidirectional state container for Rust.
//!
//! One [`Store`] owns the application state. The state changes only when an
//! action is dispatched through the root reducer, and subscribers are told
//! about it afterwards, in the order they subscribed.
//!
//! ## Core
//!
//! - [`create_dispatcher`] / [`Store`] - holds state, applies actions, notifies subscribers
//! - [`combine_reducers`] - builds a root reducer out of named slice reducers
//! - [`distinct_selector`] - single-slot memoized derivations over state
//! - [`wrap_actions`] - action creators curried with a dispatch function
//!
//! ## Binding
//!
//! [`Provider`], [`connect_store`] and [`connect_actions`] hand the store to
//! consumers by explicit injection.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::{json, Value};
//! use unistore::create_dispatcher;
//!
//! let store = create_dispatcher(
//!     |count: &Arc<i64>, action: &Value| match action["type"].as_str() {
//!         Some("INC") => Arc::new(**count + 1),
//!         _ => Arc::clone(count),
//!     },
//!     0i64,
//! );
//!
//! store.dispatch(json!({ "type": "INC" })).unwrap();
//! assert_eq!(*store.get_state(), 1);
//! ```

pub mod action;
pub mod binding;
pub mod error;
pub mod reducer;
pub mod selector;
pub mod store;

// Re-export main types for convenience
pub use action::{bind_action, wrap_actions, Action, ActionCreators, BoundAction, BoundActions};
pub use binding::{connect_actions, connect_store, Connected, Provider};
pub use error::StoreError;
pub use reducer::{combine_reducers, CombinedReducer, CombinedState, Reducer, SliceReducers};
pub use selector::{
    deep_selector, distinct_selector, distinct_selector_by, DistinctSelector, Identity, Selected,
};
pub use store::{create_dispatcher, Reentrancy, Store, StoreBuilder, Subscription};
