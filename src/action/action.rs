use serde_json::Value;

use crate::error::{Result, StoreError};

/// A record describing an intent to change state.
///
/// The type tag is what reducers branch on. Enums usually return a fixed
/// name per variant:
///
/// ```
/// use unistore::Action;
///
/// #[derive(Clone)]
/// enum Counter {
///     Inc,
///     Add(i64),
/// }
///
/// impl Action for Counter {
///     fn action_type(&self) -> Option<&str> {
///         Some(match self {
///             Counter::Inc => "INC",
///             Counter::Add(_) => "ADD",
///         })
///     }
/// }
///
/// assert_eq!(Counter::Add(2).action_type(), Some("ADD"));
/// ```
pub trait Action {
    /// The discriminating type, or `None` when the record has none.
    fn action_type(&self) -> Option<&str>;
}

/// Plain JSON records are actions when they carry a string `"type"` field.
impl Action for Value {
    fn action_type(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }
}

impl<A: Action + ?Sized> Action for &A {
    fn action_type(&self) -> Option<&str> {
        (**self).action_type()
    }
}

/// Returns the action's type, rejecting records without a non-empty one.
pub(crate) fn validated_type<A: Action + ?Sized>(action: &A) -> Result<&str> {
    match action.action_type() {
        Some(kind) if !kind.is_empty() => Ok(kind),
        _ => Err(StoreError::MalformedAction),
    }
}
