//! Copy-on-iterate handler registry.
//!
//! `emit` clones the handler list before invoking anything, so handlers may
//! subscribe or unsubscribe (themselves included) while being called. A
//! handler removed mid-dispatch still sees the value being dispatched.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// Set of callbacks invoked in registration order.
pub struct HandlerSet<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> HandlerSet<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Registers `handler` and returns the handle that removes it.
    pub fn add<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.push((id, Arc::new(handler)));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.lock().handlers.retain(|(h, _)| *h != id);
            }
        })
    }

    /// Invokes every handler registered at the time of the call.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Handler<T>> = self
            .registry
            .lock()
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();

        for handler in snapshot {
            handler(value);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.registry.lock().handlers.clear();
    }
}

impl<T: 'static> Default for HandlerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for HandlerSet<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<T> fmt::Debug for HandlerSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("handlers", &self.registry.lock().handlers.len())
            .finish()
    }
}

/// Handle returned by every `subscribe`/`on_*` call.
///
/// Dropping the handle keeps the handler registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping a Subscription leaves the handler registered forever"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Combines several subscriptions into one handle.
    pub fn merge(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || {
            for subscription in subscriptions {
                subscription.unsubscribe();
            }
        })
    }

    /// Removes the handler. Safe to call from inside the handler itself.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
