use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::{wrap_actions, Action, ActionCreators, BoundActions};
use crate::error::Result;
use crate::selector::{DistinctSelector, Identity};
use crate::store::{Store, Subscription};

/// Hands one store to the components built under it.
///
/// Components receive the store (or actions bound to it) as explicit
/// arguments instead of looking it up from an ambient context.
pub struct Provider<S, A> {
    store: Store<S, A>,
}

impl<S, A> Provider<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Clone + Send + 'static,
{
    /// Wrap `store` for handing out to components.
    pub fn new(store: Store<S, A>) -> Self {
        Self { store }
    }

    /// The provided store.
    pub fn store(&self) -> &Store<S, A> {
        &self.store
    }

    /// Build a component that needs the store.
    pub fn with_store<F, T>(&self, build: F) -> T
    where
        F: FnOnce(Store<S, A>) -> T,
    {
        build(self.store.clone())
    }

    /// Bind `creators` to this store's dispatch.
    pub fn with_actions<P: 'static>(&self, creators: ActionCreators<P, A>) -> BoundActions<P, Result<A>> {
        connect_actions(&self.store, creators)
    }
}

impl<S, A> Clone for Provider<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

/// A live connection between a store and one consumer.
///
/// Dropping it ends the subscription.
pub struct Connected<R> {
    current: Arc<Mutex<R>>,
    subscription: Subscription,
}

impl<R: Clone> Connected<R> {
    /// The most recently delivered selection.
    pub fn current(&self) -> R {
        self.current.lock().clone()
    }

    /// End the connection. Returns `false` if it had already ended.
    pub fn disconnect(self) -> bool {
        self.subscription.unsubscribe()
    }
}

/// Subscribe a consumer to the slice of state picked by `selector`.
///
/// `on_change` runs only when the selection is recomputed and yields a value
/// not identical to the previous one, so state changes elsewhere in the tree
/// never reach it.
pub fn connect_store<S, A, R, F>(
    store: &Store<S, A>,
    selector: DistinctSelector<Arc<S>, R>,
    on_change: F,
) -> Connected<R>
where
    S: Send + Sync + 'static,
    A: Action + Clone + Send + 'static,
    R: Identity + Clone + Send + 'static,
    F: Fn(&R) + Send + Sync + 'static,
{
    let selector = Arc::new(selector);
    let current = Arc::new(Mutex::new(selector.select(store.get_state())));

    let latest = Arc::clone(&current);
    let subscription = store.subscribe(move |state: &Arc<S>| {
        let selected = selector.select_distinct(Arc::clone(state));
        if !selected.changed {
            return;
        }
        {
            let mut latest = latest.lock();
            if latest.is_identical(&selected.value) {
                return;
            }
            *latest = selected.value.clone();
        }
        on_change(&selected.value);
    });

    Connected {
        current,
        subscription,
    }
}

/// Bind `creators` to `store`'s dispatch.
pub fn connect_actions<S, A, P>(store: &Store<S, A>, creators: ActionCreators<P, A>) -> BoundActions<P, Result<A>>
where
    S: Send + Sync + 'static,
    A: Action + Clone + Send + 'static,
    P: 'static,
{
    wrap_actions(creators, store.dispatcher())
}
