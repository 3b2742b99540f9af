use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};

use super::subscription::{panic_message, Subscribers, Subscription};
use crate::action::{validated_type, Action};
use crate::error::{Result, StoreError};
use crate::reducer::Reducer;
use crate::selector::DistinctSelector;

/// What the store does when a reducer or subscriber dispatches while
/// another dispatch is still in flight on the same thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reentrancy {
    /// Run the nested action once the current dispatch completes, in FIFO order.
    #[default]
    Queue,
    /// Fail the nested dispatch with [`StoreError::ReentrantDispatch`].
    Reject,
}

struct DispatchLoop<A> {
    in_flight: bool,
    pending: VecDeque<A>,
}

struct Shared<S, A> {
    name: String,
    reentrancy: Reentrancy,
    reducer: Box<dyn Reducer<S, A>>,
    state: RwLock<Arc<S>>,
    subscribers: Arc<Subscribers<S>>,
    // Serializes dispatch across threads; the same thread may re-enter from a reducer or subscriber.
    dispatch: ReentrantMutex<RefCell<DispatchLoop<A>>>,
}

/// Configures and creates a [`Store`].
pub struct StoreBuilder<S, A> {
    reducer: Box<dyn Reducer<S, A>>,
    initial: Arc<S>,
    name: String,
    reentrancy: Reentrancy,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Clone + Send + 'static,
{
    /// Label used in log events. Defaults to `"store"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Policy for nested dispatch. Defaults to [`Reentrancy::Queue`].
    pub fn reentrancy(mut self, reentrancy: Reentrancy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    /// Finish configuration.
    pub fn build(self) -> Store<S, A> {
        tracing::debug!(store = %self.name, reentrancy = ?self.reentrancy, "store created");
        Store {
            shared: Arc::new(Shared {
                name: self.name,
                reentrancy: self.reentrancy,
                reducer: self.reducer,
                state: RwLock::new(self.initial),
                subscribers: Arc::new(Subscribers::new()),
                dispatch: ReentrantMutex::new(RefCell::new(DispatchLoop {
                    in_flight: false,
                    pending: VecDeque::new(),
                })),
            }),
        }
    }
}

/// The single mutable state container of an application.
///
/// State only changes through [`dispatch`](Self::dispatch). Subscribers run
/// after every dispatch whose reducer returned a new state `Arc`, in the
/// order they subscribed. Cloning a `Store` yields another handle to the
/// same state.
pub struct Store<S, A> {
    shared: Arc<Shared<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Clone + Send + 'static,
{
    /// Create a store with default options.
    pub fn new<R>(reducer: R, initial: impl Into<Arc<S>>) -> Self
    where
        R: Reducer<S, A>,
    {
        Self::builder(reducer, initial).build()
    }

    /// Start configuring a store.
    pub fn builder<R>(reducer: R, initial: impl Into<Arc<S>>) -> StoreBuilder<S, A>
    where
        R: Reducer<S, A>,
    {
        StoreBuilder {
            reducer: Box::new(reducer),
            initial: initial.into(),
            name: "store".to_string(),
            reentrancy: Reentrancy::default(),
        }
    }

    /// The current state.
    pub fn get_state(&self) -> Arc<S> {
        self.shared.state.read().clone()
    }

    /// Borrow the current state for the duration of `f`.
    ///
    /// `f` may dispatch; it keeps seeing the state as of the call.
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.get_state();
        f(&state)
    }

    /// Evaluate a memoized selector over the current state.
    pub fn select<R: Clone>(&self, selector: &DistinctSelector<Arc<S>, R>) -> R {
        selector.select(self.get_state())
    }

    /// Apply `action` through the reducer and notify subscribers if the state changed.
    ///
    /// Returns the action back. Fails without touching state if the action
    /// has no type or the reducer fails. When called from a subscriber, the
    /// action is queued (or rejected, under [`Reentrancy::Reject`]) and the
    /// call returns before it is applied. The same holds for a dispatch made
    /// from inside the reducer.
    pub fn dispatch(&self, action: A) -> Result<A> {
        let action_type = validated_type(&action)?.to_string();
        let shared = &*self.shared;
        let guard = shared.dispatch.lock();

        {
            let mut dispatch = guard.borrow_mut();
            if dispatch.in_flight {
                return match shared.reentrancy {
                    Reentrancy::Queue => {
                        tracing::trace!(store = %shared.name, action = %action_type, "nested dispatch queued");
                        dispatch.pending.push_back(action.clone());
                        Ok(action)
                    }
                    Reentrancy::Reject => {
                        tracing::warn!(store = %shared.name, action = %action_type, "nested dispatch rejected");
                        Err(StoreError::ReentrantDispatch { action_type })
                    }
                };
            }
            dispatch.in_flight = true;
        }

        let outcome = self.apply(&action_type, &action);

        loop {
            let next = guard.borrow_mut().pending.pop_front();
            let Some(next) = next else { break };
            let next_type = next.action_type().unwrap_or_default().to_string();
            if let Err(err) = self.apply(&next_type, &next) {
                tracing::error!(store = %shared.name, action = %next_type, error = %err, "queued action failed");
            }
        }
        guard.borrow_mut().in_flight = false;

        outcome.map(|()| action)
    }

    // Runs with `in_flight` set, so nested dispatches from the reducer or a
    // subscriber go through the reentrancy policy.
    fn apply(&self, action_type: &str, action: &A) -> Result<()> {
        let shared = &*self.shared;
        let previous = self.get_state();

        let next = catch_unwind(AssertUnwindSafe(|| shared.reducer.reduce(&previous, action)))
            .map_err(|payload| {
                tracing::error!(
                    store = %shared.name,
                    action = action_type,
                    panic = panic_message(payload.as_ref()),
                    "reducer panicked"
                );
                StoreError::ReducerPanicked {
                    action_type: action_type.to_string(),
                }
            })??;

        if Arc::ptr_eq(&previous, &next) {
            tracing::trace!(store = %shared.name, action = action_type, "state unchanged");
            return Ok(());
        }

        *shared.state.write() = Arc::clone(&next);
        tracing::debug!(store = %shared.name, action = action_type, "state changed");

        shared.subscribers.notify(&next, &shared.name);
        Ok(())
    }

    /// Register `callback` to run after each state change.
    ///
    /// Registering the same callback twice yields two independent
    /// notifications. The callback receives the new state.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<S>) + Send + Sync + 'static,
    {
        self.shared.subscribers.add(callback)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    /// The label given at build time.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// An owned dispatch function, for [`wrap_actions`](crate::wrap_actions).
    pub fn dispatcher(&self) -> impl Fn(A) -> Result<A> + Send + Sync + 'static {
        let store = self.clone();
        move |action: A| store.dispatch(action)
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.shared.name)
            .field("reentrancy", &self.shared.reentrancy)
            .finish_non_exhaustive()
    }
}

/// Create a store from a root reducer and its initial state.
pub fn create_dispatcher<S, A, R>(reducer: R, initial: impl Into<Arc<S>>) -> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action + Clone + Send + 'static,
    R: Reducer<S, A>,
{
    Store::new(reducer, initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Count {
        count: i64,
    }

    fn counter(state: &Arc<Count>, action: &Value) -> Arc<Count> {
        match action["type"].as_str() {
            Some("INC") => Arc::new(Count {
                count: state.count + 1,
            }),
            _ => Arc::clone(state),
        }
    }

    fn counting(calls: &Arc<AtomicUsize>) -> impl Fn(&Arc<Count>) + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |_: &Arc<Count>| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counter_scenario() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let calls = Arc::new(AtomicUsize::new(0));
        store.subscribe(counting(&calls)).detach();

        store.dispatch(json!({ "type": "INC" })).unwrap();
        store.dispatch(json!({ "type": "INC" })).unwrap();
        let before = store.get_state();
        store.dispatch(json!({ "type": "NOOP" })).unwrap();

        assert_eq!(*store.get_state(), Count { count: 2 });
        assert!(Arc::ptr_eq(&before, &store.get_state()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn malformed_action_never_reaches_reducer() {
        let reduced = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&reduced);
        let store = create_dispatcher(
            move |state: &Arc<Count>, _: &Value| {
                seen.fetch_add(1, Ordering::SeqCst);
                Arc::clone(state)
            },
            Count { count: 0 },
        );

        assert_eq!(store.dispatch(json!({ "kind": "INC" })), Err(StoreError::MalformedAction));
        assert_eq!(reduced.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispatch_returns_the_action() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let action = json!({ "type": "INC", "note": "x" });
        assert_eq!(store.dispatch(action.clone()), Ok(action));
    }

    #[test]
    fn nested_dispatch_is_queued_until_pass_completes() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let observed = Arc::new(Mutex::new(Vec::new()));

        let inner = store.clone();
        let log = Arc::clone(&observed);
        store
            .subscribe(move |state: &Arc<Count>| {
                log.lock().push(("first", state.count));
                if state.count == 1 {
                    inner.dispatch(json!({ "type": "INC" })).unwrap();
                    // Not applied yet: the current pass has not finished.
                    assert_eq!(inner.get_state().count, 1);
                }
            })
            .detach();
        let log = Arc::clone(&observed);
        store
            .subscribe(move |state: &Arc<Count>| log.lock().push(("second", state.count)))
            .detach();

        store.dispatch(json!({ "type": "INC" })).unwrap();

        assert_eq!(store.get_state().count, 2);
        assert_eq!(
            *observed.lock(),
            vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
        );
    }

    type Trail = Vec<&'static str>;

    fn trail_store(reentrancy: Reentrancy) -> (Store<Trail, Value>, Arc<Mutex<Vec<Result<Value>>>>) {
        let handle: Arc<Mutex<Option<Store<Trail, Value>>>> = Arc::new(Mutex::new(None));
        let inner_results = Arc::new(Mutex::new(Vec::new()));

        let slot = Arc::clone(&handle);
        let results = Arc::clone(&inner_results);
        let store = Store::builder(
            move |state: &Arc<Trail>, action: &Value| {
                let step = match action["type"].as_str() {
                    Some("OUTER") => {
                        let store = slot.lock().clone();
                        if let Some(store) = store {
                            results.lock().push(store.dispatch(json!({ "type": "INNER" })));
                        }
                        "OUTER"
                    }
                    Some("INNER") => "INNER",
                    _ => return Arc::clone(state),
                };
                let mut next = state.as_ref().clone();
                next.push(step);
                Arc::new(next)
            },
            Trail::new(),
        )
        .reentrancy(reentrancy)
        .build();
        *handle.lock() = Some(store.clone());
        (store, inner_results)
    }

    #[test]
    fn dispatch_from_reducer_is_queued_after_outer() {
        let (store, inner_results) = trail_store(Reentrancy::Queue);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        store
            .subscribe(move |state: &Arc<Trail>| log.lock().push(state.as_ref().clone()))
            .detach();

        store.dispatch(json!({ "type": "OUTER" })).unwrap();

        assert_eq!(*store.get_state(), vec!["OUTER", "INNER"]);
        assert_eq!(*seen.lock(), vec![vec!["OUTER"], vec!["OUTER", "INNER"]]);
        assert_eq!(*inner_results.lock(), vec![Ok(json!({ "type": "INNER" }))]);
    }

    #[test]
    fn dispatch_from_reducer_rejected_by_policy() {
        let (store, inner_results) = trail_store(Reentrancy::Reject);

        store.dispatch(json!({ "type": "OUTER" })).unwrap();

        assert_eq!(*store.get_state(), vec!["OUTER"]);
        assert_eq!(
            *inner_results.lock(),
            vec![Err(StoreError::ReentrantDispatch {
                action_type: "INNER".to_string()
            })]
        );
    }

    #[test]
    fn read_callback_may_dispatch() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let before = store.read(|state| {
            store.dispatch(json!({ "type": "INC" })).unwrap();
            state.count
        });

        assert_eq!(before, 0);
        assert_eq!(store.get_state().count, 1);
    }

    #[test]
    fn nested_dispatch_rejected_by_policy() {
        let store = Store::builder(counter, Count { count: 0 })
            .name("strict")
            .reentrancy(Reentrancy::Reject)
            .build();
        let result = Arc::new(Mutex::new(None));

        let inner = store.clone();
        let slot = Arc::clone(&result);
        store
            .subscribe(move |_: &Arc<Count>| {
                *slot.lock() = Some(inner.dispatch(json!({ "type": "INC" })));
            })
            .detach();

        store.dispatch(json!({ "type": "INC" })).unwrap();

        assert_eq!(store.name(), "strict");
        assert_eq!(store.get_state().count, 1);
        assert_eq!(
            *result.lock(),
            Some(Err(StoreError::ReentrantDispatch {
                action_type: "INC".to_string()
            }))
        );
    }

    #[test]
    fn unsubscribe_during_pass_keeps_others() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let calls = Arc::new(AtomicUsize::new(0));
        let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&own);
        let quitter_calls = Arc::new(AtomicUsize::new(0));
        let quitter_seen = Arc::clone(&quitter_calls);
        let handle = store.subscribe(move |_: &Arc<Count>| {
            quitter_seen.fetch_add(1, Ordering::SeqCst);
            if let Some(subscription) = slot.lock().take() {
                assert!(subscription.unsubscribe());
            }
        });
        *own.lock() = Some(handle);
        store.subscribe(counting(&calls)).detach();

        store.dispatch(json!({ "type": "INC" })).unwrap();
        store.dispatch(json!({ "type": "INC" })).unwrap();

        assert_eq!(quitter_calls.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn subscriber_removing_a_later_one_does_not_skip_it_this_pass() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let later_calls = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&victim);
        store
            .subscribe(move |_: &Arc<Count>| {
                slot.lock().take();
            })
            .detach();
        *victim.lock() = Some(store.subscribe(counting(&later_calls)));

        store.dispatch(json!({ "type": "INC" })).unwrap();
        store.dispatch(json!({ "type": "INC" })).unwrap();

        assert_eq!(later_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_reducer_leaves_state() {
        let store = create_dispatcher(
            |state: &Arc<Count>, action: &Value| {
                if action["type"] == "BOOM" {
                    panic!("reducer bug");
                }
                Arc::clone(state)
            },
            Count { count: 4 },
        );
        let before = store.get_state();

        assert_eq!(
            store.dispatch(json!({ "type": "BOOM" })),
            Err(StoreError::ReducerPanicked {
                action_type: "BOOM".to_string()
            })
        );
        assert!(Arc::ptr_eq(&before, &store.get_state()));
        assert!(store.dispatch(json!({ "type": "OK" })).is_ok());
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let calls = Arc::new(AtomicUsize::new(0));
        store.subscribe(|_: &Arc<Count>| panic!("listener bug")).detach();
        store.subscribe(counting(&calls)).detach();

        assert!(store.dispatch(json!({ "type": "INC" })).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_dispatches_are_serialized() {
        let store = create_dispatcher(counter, Count { count: 0 });
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.dispatch(json!({ "type": "INC" })).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get_state().count, 1000);
    }

    #[test]
    fn select_reuses_cache_for_unchanged_state() {
        let store = create_dispatcher(counter, Count { count: 3 });
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let doubled = DistinctSelector::new(move |state: &Arc<Count>| {
            seen.fetch_add(1, Ordering::SeqCst);
            state.count * 2
        });

        assert_eq!(store.select(&doubled), 6);
        store.dispatch(json!({ "type": "NOOP" })).unwrap();
        assert_eq!(store.select(&doubled), 6);
        store.dispatch(json!({ "type": "INC" })).unwrap();
        assert_eq!(store.select(&doubled), 8);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.read(|state| state.count), 4);
    }
}
