use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, StoreError};

type Creator<P, A> = Arc<dyn Fn(P) -> A + Send + Sync>;

/// A named mapping of action creators sharing one argument type.
///
/// Arguments are passed through untouched, so `P` is whatever the creators
/// take: `()` for zero-argument creators, a tuple for several, a
/// `serde_json::Value` for free-form payloads.
pub struct ActionCreators<P, A> {
    creators: BTreeMap<String, Creator<P, A>>,
}

impl<P, A> ActionCreators<P, A> {
    /// An empty set of creators.
    pub fn new() -> Self {
        Self {
            creators: BTreeMap::new(),
        }
    }

    /// Register `creator` under `name`, replacing any previous one.
    pub fn with<F>(mut self, name: impl Into<String>, creator: F) -> Self
    where
        F: Fn(P) -> A + Send + Sync + 'static,
    {
        self.creators.insert(name.into(), Arc::new(creator));
        self
    }

    /// Number of registered creators.
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    /// Whether no creator is registered.
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl<P, A> Default for ActionCreators<P, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, A> Clone for ActionCreators<P, A> {
    fn clone(&self) -> Self {
        Self {
            creators: self.creators.clone(),
        }
    }
}

/// An action creator curried with a dispatch function.
pub struct BoundAction<P, R> {
    call: Arc<dyn Fn(P) -> R + Send + Sync>,
}

impl<P, R> BoundAction<P, R> {
    /// Create the action from `args` and dispatch it, returning what dispatch returns.
    pub fn call(&self, args: P) -> R {
        (self.call)(args)
    }
}

impl<P, R> Clone for BoundAction<P, R> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
        }
    }
}

impl<P, R> fmt::Debug for BoundAction<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction").finish_non_exhaustive()
    }
}

/// The result of [`wrap_actions`]: the same names, each bound to dispatch.
pub struct BoundActions<P, R> {
    actions: BTreeMap<String, BoundAction<P, R>>,
}

impl<P, R> BoundActions<P, R> {
    /// The bound action registered under `name`.
    pub fn get(&self, name: &str) -> Option<&BoundAction<P, R>> {
        self.actions.get(name)
    }

    /// Call the bound action registered under `name`.
    pub fn call(&self, name: &str, args: P) -> Result<R> {
        self.actions
            .get(name)
            .map(|action| action.call(args))
            .ok_or_else(|| StoreError::UnknownAction {
                name: name.to_string(),
            })
    }

    /// Names of every bound action.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Number of bound actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<P, R> Clone for BoundActions<P, R> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
        }
    }
}

impl<P, R> fmt::Debug for BoundActions<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

/// Bind a single action creator to `dispatch`.
pub fn bind_action<P, A, R, C, D>(creator: C, dispatch: D) -> BoundAction<P, R>
where
    P: 'static,
    A: 'static,
    R: 'static,
    C: Fn(P) -> A + Send + Sync + 'static,
    D: Fn(A) -> R + Send + Sync + 'static,
{
    BoundAction {
        call: Arc::new(move |args: P| dispatch(creator(args))),
    }
}

/// Bind every creator in `creators` to `dispatch`.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use unistore::{wrap_actions, ActionCreators};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let log = Arc::clone(&seen);
/// let actions = wrap_actions(
///     ActionCreators::new().with("inc", |()| "INC"),
///     move |action: &'static str| {
///         log.lock().unwrap().push(action);
///         action
///     },
/// );
///
/// assert_eq!(actions.call("inc", ()), Ok("INC"));
/// assert_eq!(*seen.lock().unwrap(), vec!["INC"]);
/// ```
pub fn wrap_actions<P, A, R, D>(creators: ActionCreators<P, A>, dispatch: D) -> BoundActions<P, R>
where
    P: 'static,
    A: 'static,
    R: 'static,
    D: Fn(A) -> R + Send + Sync + 'static,
{
    let dispatch = Arc::new(dispatch);
    let actions = creators
        .creators
        .into_iter()
        .map(|(name, creator)| {
            let dispatch = Arc::clone(&dispatch);
            let bound = BoundAction {
                call: Arc::new(move |args: P| dispatch(creator(args))),
            };
            (name, bound)
        })
        .collect();

    BoundActions { actions }
}
