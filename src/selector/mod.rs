//! Memoized selectors.
//!
//! Selectors derive read values from state. A `DistinctSelector` remembers
//! its last inputs and result, so consumers that re-run it against unchanged
//! state get the same cached value back without recomputation.

mod distinct;
mod identity;

pub use distinct::{
    deep_selector, distinct_selector, distinct_selector_by, DistinctSelector, Selected,
};
pub use identity::Identity;
