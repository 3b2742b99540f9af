use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<S> = Arc<dyn Fn(&Arc<S>) + Send + Sync>;

/// Ordered subscriber callbacks of one store.
pub(crate) struct Subscribers<S> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback<S>)>>,
}

impl<S: Send + Sync + 'static> Subscribers<S> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&Arc<S>) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, Arc::new(callback)));

        let list: Arc<dyn Unsubscribe> = Arc::clone(self) as Arc<dyn Unsubscribe>;
        Subscription {
            id,
            list: Some(Arc::downgrade(&list)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Invoke every callback registered when the pass starts, in order.
    ///
    /// A panicking callback is logged and skipped; the sweep continues.
    /// Returns how many callbacks panicked.
    pub(crate) fn notify(&self, state: &Arc<S>, store: &str) -> usize {
        let snapshot: Vec<(u64, Callback<S>)> = self.entries.lock().clone();
        let mut failed = 0;

        for (id, callback) in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(state))) {
                failed += 1;
                tracing::error!(
                    store,
                    subscriber = id,
                    panic = panic_message(payload.as_ref()),
                    "subscriber panicked; continuing notification"
                );
            }
        }
        failed
    }
}

pub(crate) trait Unsubscribe: Send + Sync {
    fn remove(&self, id: u64) -> bool;
}

impl<S: Send + Sync + 'static> Unsubscribe for Subscribers<S> {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Handle to a registered subscriber.
///
/// Dropping it unsubscribes. Call [`detach`](Self::detach) to keep the
/// callback for as long as the store lives.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    list: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    /// Remove the callback. Returns `false` if it was already removed or the store is gone.
    ///
    /// Safe to call from inside the callback itself: the current
    /// notification pass still completes for every other subscriber.
    pub fn unsubscribe(&self) -> bool {
        self.list
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|list| list.remove(self.id))
            .unwrap_or(false)
    }

    /// Leave the callback registered and release this handle.
    pub fn detach(mut self) {
        self.list = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("detached", &self.list.is_none())
            .finish()
    }
}
