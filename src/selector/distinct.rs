use std::fmt;

use parking_lot::Mutex;

use super::identity::Identity;

type Derive<Args, R> = Box<dyn Fn(&Args) -> R + Send + Sync>;
type Equality<Args> = Box<dyn Fn(&Args, &Args) -> bool + Send + Sync>;

/// A value produced by a selector, with whether it was recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selected<R> {
    pub value: R,
    /// `false` when the inputs matched the previous call and the cached value was returned.
    pub changed: bool,
}

/// A single-slot memoized derivation.
///
/// Only the most recent `(inputs, result)` pair is kept; alternating between
/// two input sets recomputes every time. Each instance owns its cache; share
/// one instance (e.g. behind an `Arc`) to share results between consumers.
pub struct DistinctSelector<Args, R> {
    derive: Derive<Args, R>,
    equals: Equality<Args>,
    cache: Mutex<Option<(Args, R)>>,
}

impl<Args, R: Clone> DistinctSelector<Args, R> {
    /// Create a selector comparing inputs with `equals`.
    pub fn with_equality<F, E>(derive: F, equals: E) -> Self
    where
        F: Fn(&Args) -> R + Send + Sync + 'static,
        E: Fn(&Args, &Args) -> bool + Send + Sync + 'static,
    {
        Self {
            derive: Box::new(derive),
            equals: Box::new(equals),
            cache: Mutex::new(None),
        }
    }

    /// Return the derived value for `args`, recomputing only when they changed.
    pub fn select(&self, args: Args) -> R {
        self.select_distinct(args).value
    }

    /// Like [`select`](Self::select), also reporting whether a recomputation happened.
    pub fn select_distinct(&self, args: Args) -> Selected<R> {
        if let Some((last, value)) = self.cache.lock().as_ref() {
            if (self.equals)(last, &args) {
                return Selected {
                    value: value.clone(),
                    changed: false,
                };
            }
        }

        // Derivation runs unlocked so it may consult other selectors freely.
        let value = (self.derive)(&args);
        *self.cache.lock() = Some((args, value.clone()));
        Selected {
            value,
            changed: true,
        }
    }

    /// Drop the cached pair; the next call recomputes.
    pub fn reset(&self) {
        self.cache.lock().take();
    }

    /// Whether a result is currently cached.
    pub fn is_cached(&self) -> bool {
        self.cache.lock().is_some()
    }
}

impl<Args: Identity + 'static, R: Clone> DistinctSelector<Args, R> {
    /// Create a selector comparing inputs by [`Identity`].
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn(&Args) -> R + Send + Sync + 'static,
    {
        Self::with_equality(derive, Args::is_identical)
    }
}

impl<Args, R> fmt::Debug for DistinctSelector<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistinctSelector")
            .field("cached", &self.cache.lock().is_some())
            .finish_non_exhaustive()
    }
}

/// Memoize `derive` on reference-identity of its inputs.
///
/// ```
/// use std::sync::Arc;
/// use unistore::distinct_selector;
///
/// let total = distinct_selector(|items: &Arc<Vec<u32>>| items.iter().sum::<u32>());
/// let items = Arc::new(vec![1, 2, 3]);
///
/// assert!(total.select_distinct(Arc::clone(&items)).changed);
/// assert!(!total.select_distinct(Arc::clone(&items)).changed);
/// assert_eq!(total.select(items), 6);
/// ```
pub fn distinct_selector<Args, R, F>(derive: F) -> DistinctSelector<Args, R>
where
    Args: Identity + 'static,
    R: Clone,
    F: Fn(&Args) -> R + Send + Sync + 'static,
{
    DistinctSelector::new(derive)
}

/// Memoize `derive` with a caller-supplied input equality.
pub fn distinct_selector_by<Args, R, F, E>(derive: F, equals: E) -> DistinctSelector<Args, R>
where
    R: Clone,
    F: Fn(&Args) -> R + Send + Sync + 'static,
    E: Fn(&Args, &Args) -> bool + Send + Sync + 'static,
{
    DistinctSelector::with_equality(derive, equals)
}

/// Memoize `derive` on structural (`PartialEq`) equality of its inputs.
pub fn deep_selector<Args, R, F>(derive: F) -> DistinctSelector<Args, R>
where
    Args: PartialEq + 'static,
    R: Clone,
    F: Fn(&Args) -> R + Send + Sync + 'static,
{
    DistinctSelector::with_equality(derive, |a: &Args, b: &Args| a == b)
}
