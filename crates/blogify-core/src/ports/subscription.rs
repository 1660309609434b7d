//! Cancelable live-subscription handle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Handle to a live subscription.
///
/// Cancelling the handle, or dropping it, detaches the listener. Once
/// [`Subscription::cancel`] returns, no further callback is started. A
/// callback may cancel or drop its own handle.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the detach action of a live listener.
    pub fn new(on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    /// A handle with nothing to detach.
    pub fn noop() -> Self {
        Self { on_cancel: None }
    }

    pub fn cancel(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.on_cancel.is_some())
            .finish()
    }
}

/// Gate shared between a subscription handle and whatever delivers its
/// callbacks.
///
/// Deliveries are serialized, so [`DeliveryGate::close`] waits for an
/// in-flight callback on another thread and every later delivery is skipped.
/// Closing from inside the gate's own callback returns at once; the running
/// callback finishes and nothing is delivered after it.
#[derive(Debug, Clone, Default)]
pub struct DeliveryGate {
    inner: Arc<GateInner>,
}

#[derive(Debug, Default)]
struct GateInner {
    closed: AtomicBool,
    delivery: Mutex<()>,
    delivering: Mutex<Option<ThreadId>>,
}

impl DeliveryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `deliver` if the gate is still open. Returns whether it ran.
    pub fn deliver(&self, deliver: impl FnOnce()) -> bool {
        if !self.is_open() {
            return false;
        }
        if self.delivering_here() {
            // Nested delivery from our own callback; the lock is already ours.
            deliver();
            return true;
        }

        let _delivery = lock(&self.inner.delivery);
        if !self.is_open() {
            return false;
        }
        let _owner = OwnerGuard::enter(&self.inner);
        deliver();
        true
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        if !self.delivering_here() {
            drop(lock(&self.inner.delivery));
        }
    }

    pub fn is_open(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst)
    }

    fn delivering_here(&self) -> bool {
        *lock(&self.inner.delivering) == Some(thread::current().id())
    }
}

/// Marks the current thread as the one running the gate's callback.
struct OwnerGuard<'a> {
    inner: &'a GateInner,
}

impl<'a> OwnerGuard<'a> {
    fn enter(inner: &'a GateInner) -> Self {
        *lock(&inner.delivering) = Some(thread::current().id());
        Self { inner }
    }
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.inner.delivering) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
