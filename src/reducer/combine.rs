use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::reducer::Reducer;
use crate::error::{Result, StoreError};

type Slice = Arc<dyn Any + Send + Sync>;

/// Composite state: one immutable value per slice key.
///
/// Slices are type-erased so each key can hold its own type; read them back
/// with [`CombinedState::get`].
#[derive(Clone, Default)]
pub struct CombinedState {
    slices: BTreeMap<String, Slice>,
}

impl CombinedState {
    /// An empty state with no slices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slice, mainly for building an initial state by hand.
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.slices.insert(key.into(), Arc::new(value));
        self
    }

    /// The slice under `key`, if present and of type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.try_get(key).ok().flatten()
    }

    /// Like [`get`](Self::get) but reports a type mismatch instead of hiding it.
    pub fn try_get<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>> {
        match self.slices.get(key) {
            None => Ok(None),
            Some(slice) => downcast(key, slice).map(Some),
        }
    }

    /// Slice keys present in this state.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether the state holds no slices.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl fmt::Debug for CombinedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedState")
            .field("keys", &self.slices.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn downcast<T: Any + Send + Sync>(key: &str, slice: &Slice) -> Result<Arc<T>> {
    Arc::clone(slice)
        .downcast::<T>()
        .map_err(|_| StoreError::SliceType {
            key: key.to_string(),
            expected: type_name::<T>(),
        })
}

enum Step {
    Kept,
    Replaced(Slice),
}

type SliceFn<A> = Box<dyn Fn(Option<&Slice>, &A) -> Result<Step> + Send + Sync>;

/// Named slice reducers, consumed by [`combine_reducers`].
///
/// A slice reducer receives `None` when its slice is absent and must supply
/// a default; returning `None` is a configuration fault.
pub struct SliceReducers<A> {
    slices: Vec<(String, SliceFn<A>)>,
}

impl<A: 'static> SliceReducers<A> {
    /// No slices yet.
    pub fn new() -> Self {
        Self { slices: Vec::new() }
    }

    /// Register `reducer` under `key`, replacing any reducer already there.
    pub fn with<T, F>(mut self, key: impl Into<String>, reducer: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Option<&Arc<T>>, &A) -> Option<Arc<T>> + Send + Sync + 'static,
    {
        let key = key.into();
        let slice_key = key.clone();
        let erased: SliceFn<A> = Box::new(move |current: Option<&Slice>, action: &A| -> Result<Step> {
            let current = current.map(|slice| downcast::<T>(&slice_key, slice)).transpose()?;
            let next = reducer(current.as_ref(), action).ok_or_else(|| StoreError::UndefinedSlice {
                key: slice_key.clone(),
            })?;
            match current {
                Some(current) if Arc::ptr_eq(&current, &next) => Ok(Step::Kept),
                _ => Ok(Step::Replaced(next)),
            }
        });

        match self.slices.iter().position(|(existing, _)| *existing == key) {
            Some(index) => self.slices[index].1 = erased,
            None => self.slices.push((key, erased)),
        }
        self
    }
}

impl<A: 'static> Default for SliceReducers<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Root reducer built from named slice reducers.
///
/// Slices are reduced in registration order. Keys present in the state
/// without a registered reducer pass through untouched.
pub struct CombinedReducer<A> {
    slices: Vec<(String, SliceFn<A>)>,
}

impl<A> CombinedReducer<A> {
    /// Registered slice keys, in reduction order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|(key, _)| key.as_str())
    }

    /// Build the initial state by running every slice reducer on an absent slice.
    ///
    /// Fails with [`StoreError::UndefinedSlice`] if any reducer has no default.
    pub fn initial_state(&self, action: &A) -> Result<Arc<CombinedState>> {
        self.combine(&Arc::new(CombinedState::new()), action)
    }

    fn combine(&self, state: &Arc<CombinedState>, action: &A) -> Result<Arc<CombinedState>> {
        let mut changed: Option<BTreeMap<String, Slice>> = None;

        for (key, reduce) in &self.slices {
            if let Step::Replaced(next) = reduce(state.slices.get(key), action)? {
                changed
                    .get_or_insert_with(|| state.slices.clone())
                    .insert(key.clone(), next);
            }
        }

        Ok(match changed {
            Some(slices) => Arc::new(CombinedState { slices }),
            None => Arc::clone(state),
        })
    }
}

impl<A> fmt::Debug for CombinedReducer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<A: 'static> Reducer<CombinedState, A> for CombinedReducer<A> {
    fn reduce(&self, state: &Arc<CombinedState>, action: &A) -> Result<Arc<CombinedState>> {
        self.combine(state, action)
    }
}

/// Merge named slice reducers into one root reducer over [`CombinedState`].
///
/// When no slice changes, the input state `Arc` itself is returned.
///
/// ```
/// use std::sync::Arc;
/// use serde_json::{json, Value};
/// use unistore::{combine_reducers, Reducer, SliceReducers};
///
/// let root = combine_reducers(SliceReducers::new().with(
///     "count",
///     |count: Option<&Arc<i64>>, action: &Value| match (count, action["type"].as_str()) {
///         (None, _) => Some(Arc::new(0)),
///         (Some(n), Some("INC")) => Some(Arc::new(**n + 1)),
///         (Some(n), _) => Some(Arc::clone(n)),
///     },
/// ));
///
/// let state = root.initial_state(&json!({ "type": "@@INIT" })).unwrap();
/// let next = root.reduce(&state, &json!({ "type": "INC" })).unwrap();
/// assert_eq!(next.get::<i64>("count").as_deref(), Some(&1));
///
/// let same = root.reduce(&next, &json!({ "type": "NOOP" })).unwrap();
/// assert!(Arc::ptr_eq(&same, &next));
/// ```
pub fn combine_reducers<A: 'static>(reducers: SliceReducers<A>) -> CombinedReducer<A> {
    CombinedReducer {
        slices: reducers.slices,
    }
}
