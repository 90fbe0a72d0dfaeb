//! Listener registry with scoped subscriptions.
//!
//! Used for auth-state notifications from the facade and for status
//! changes of the session store. Everything here is single-threaded.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// A set of callbacks notified with `&T` on every [`Listeners::emit`].
pub struct Listeners<T> {
    inner: Rc<RefCell<Registry<T>>>,
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register `callback`. It stays registered until the returned handle is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Rc::new(callback)));
            id
        };

        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Call every registered callback with `value`.
    ///
    /// Callbacks may subscribe or unsubscribe while being notified; the set
    /// notified is the one registered when `emit` was called.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for a registered listener. Dropping it unsubscribes, exactly once.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn inert() -> Self {
        Self { release: None }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let listeners = Listeners::<u32>::new();
        let total = Rc::new(Cell::new(0));

        let t1 = Rc::clone(&total);
        let _a = listeners.subscribe(move |v| t1.set(t1.get() + v));
        let t2 = Rc::clone(&total);
        let _b = listeners.subscribe(move |v| t2.set(t2.get() + v * 10));

        listeners.emit(&2);
        assert_eq!(total.get(), 22);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let listeners = Listeners::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        let sub = listeners.subscribe(move |_| h.set(h.get() + 1));
        assert_eq!(listeners.len(), 1);

        sub.unsubscribe();
        assert!(listeners.is_empty());

        listeners.emit(&());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_release_runs_once() {
        let released = Rc::new(Cell::new(0));
        let r = Rc::clone(&released);
        let sub = Subscription::new(move || r.set(r.get() + 1));
        drop(sub);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_registry() {
        let listeners = Listeners::<()>::new();
        let sub = listeners.subscribe(|_| {});
        drop(listeners);
        // registry is gone, release must be a no-op
        drop(sub);
    }

    #[test]
    fn test_unsubscribe_during_emit() {
        let listeners = Listeners::<()>::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let s = Rc::clone(&slot);
        let h = Rc::clone(&hits);
        let sub = listeners.subscribe(move |_| {
            h.set(h.get() + 1);
            s.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        listeners.emit(&());
        listeners.emit(&());
        assert_eq!(hits.get(), 1);
        assert!(listeners.is_empty());
    }
}
