//! Error types for dispatch, reduction and action binding.

use thiserror::Error;

/// Errors surfaced by the store and its helpers.
///
/// Every variant is a contract violation on the caller's side, except
/// `ReducerPanicked`, which reports a bug inside a reducer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The dispatched action carries no usable type.
    #[error("action has no discriminating type")]
    MalformedAction,

    /// A slice reducer returned no state for its key.
    #[error("reducer for slice '{key}' returned no state")]
    UndefinedSlice { key: String },

    /// A combined slice holds a value of a different type than its reducer expects.
    #[error("slice '{key}' does not hold a value of type {expected}")]
    SliceType { key: String, expected: &'static str },

    /// A subscriber dispatched while the store was notifying and the store rejects nesting.
    #[error("nested dispatch of '{action_type}' rejected while notifying subscribers")]
    ReentrantDispatch { action_type: String },

    /// The root reducer panicked; the state was left untouched.
    #[error("reducer panicked while handling '{action_type}'")]
    ReducerPanicked { action_type: String },

    /// No action creator is bound under this name.
    #[error("no action creator bound as '{name}'")]
    UnknownAction { name: String },
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
