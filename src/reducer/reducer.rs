use std::sync::Arc;

use crate::error::Result;

/// A pure state transition over `(state, action)`.
///
/// Returning the input `Arc` (same pointer) means "nothing changed"; the
/// store skips notification in that case. Any closure of shape
/// `Fn(&Arc<S>, &A) -> Arc<S>` is a reducer:
///
/// ```
/// use std::sync::Arc;
/// use unistore::Reducer;
///
/// let reducer = |state: &Arc<i64>, action: &&str| match *action {
///     "INC" => Arc::new(**state + 1),
///     _ => Arc::clone(state),
/// };
///
/// let state = Arc::new(1);
/// assert_eq!(*reducer.reduce(&state, &"INC").unwrap(), 2);
/// assert!(Arc::ptr_eq(&reducer.reduce(&state, &"NOOP").unwrap(), &state));
/// ```
pub trait Reducer<S, A>: Send + Sync + 'static {
    /// Compute the next state. Errors are contract violations, never expected flow.
    fn reduce(&self, state: &Arc<S>, action: &A) -> Result<Arc<S>>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&Arc<S>, &A) -> Arc<S> + Send + Sync + 'static,
{
    fn reduce(&self, state: &Arc<S>, action: &A) -> Result<Arc<S>> {
        Ok(self(state, action))
    }
}
