//! Loading indicator
//!
//! Counts in-flight operations and publishes `pending > 0` for the UI
//! overlay. Every [`LoadingHandle`] decrements exactly once, either through
//! [`LoadingIndicator::end`] or when it is dropped.

use futures::stream::{self, Stream, StreamExt};
use std::cell::Cell;
use std::rc::Rc;
use tokio::sync::watch;

struct Inner {
    pending: Cell<usize>,
    loading: watch::Sender<bool>,
}

impl Inner {
    fn publish(&self) {
        let loading = self.pending.get() > 0;
        self.loading.send_if_modified(|current| {
            if *current == loading {
                false
            } else {
                *current = loading;
                true
            }
        });
    }
}

/// Cheap to clone; clones share the counter.
#[derive(Clone)]
pub struct LoadingIndicator {
    inner: Rc<Inner>,
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingIndicator {
    pub fn new() -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            inner: Rc::new(Inner {
                pending: Cell::new(0),
                loading,
            }),
        }
    }

    /// Starts tracking one operation.
    pub fn begin(&self) -> LoadingHandle {
        let pending = self.inner.pending.get() + 1;
        self.inner.pending.set(pending);
        self.inner.publish();
        tracing::trace!(pending, "loading begin");
        LoadingHandle {
            inner: self.inner.clone(),
            released: Cell::new(false),
        }
    }

    /// Stops tracking the operation behind `handle`. Later calls are no-ops.
    pub fn end(&self, handle: &LoadingHandle) {
        handle.release();
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.get()
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Current value followed by every change. Consecutive equal values are
    /// never emitted twice.
    pub fn loading_stream(&self) -> impl Stream<Item = bool> + use<> {
        let rx = self.subscribe();
        let first = *rx.borrow();
        let changes = stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let value = *rx.borrow_and_update();
            Some((value, rx))
        });
        stream::once(async move { first }).chain(changes)
    }
}

/// Scoped acquisition returned by [`LoadingIndicator::begin`].
#[must_use = "dropping the handle ends the operation immediately"]
pub struct LoadingHandle {
    inner: Rc<Inner>,
    released: Cell<bool>,
}

impl LoadingHandle {
    /// Returns `false` when the handle was already released.
    pub fn release(&self) -> bool {
        if self.released.replace(true) {
            return false;
        }
        let pending = self.inner.pending.get().saturating_sub(1);
        self.inner.pending.set(pending);
        self.inner.publish();
        tracing::trace!(pending, "loading end");
        true
    }
}

impl Drop for LoadingHandle {
    fn drop(&mut self) {
        self.release();
    }
}
