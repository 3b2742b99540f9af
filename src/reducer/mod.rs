//! Reducers and reducer composition.
//!
//! A reducer is a pure `(state, action) -> state` function. `combine_reducers`
//! merges named slice reducers into one root reducer whose output keeps the
//! input's identity whenever no slice changed.

mod combine;
mod reducer;

pub use combine::{combine_reducers, CombinedReducer, CombinedState, SliceReducers};
pub use reducer::Reducer;
