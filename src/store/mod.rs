//! The dispatcher: a single state container updated only by dispatched actions.
//!
//! Stores are explicitly constructed and passed around by handle; there is
//! no global instance, so independent stores (one per test, say) never leak
//! into each other.

mod store;
mod subscription;

pub use store::{create_dispatcher, Reentrancy, Store, StoreBuilder};
pub use subscription::Subscription;
