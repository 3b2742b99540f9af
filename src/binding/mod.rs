//! Store access for consumers, by explicit injection.
//!
//! `Provider` owns the store handle a component tree shares,
//! `connect_store` subscribes a consumer on creation and unsubscribes it on
//! drop, and `connect_actions` hands out actions already bound to dispatch.

mod connect;

pub use connect::{connect_actions, connect_store, Connected, Provider};
