//! Actions and action binding.
//!
//! Actions are transient records tagged with a type. `wrap_actions` curries
//! a mapping of action creators with a dispatch function so call sites never
//! touch the store directly.

mod action;
mod wrap;

pub use action::Action;
pub(crate) use action::validated_type;
pub use wrap::{bind_action, wrap_actions, ActionCreators, BoundAction, BoundActions};
