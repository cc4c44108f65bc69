// src/placeholder.rs
//
// Single-assignment deferred values.
//
// A Placeholder is a shared cell that is assigned at most once. Listeners
// registered before assignment fire at assignment; listeners registered
// after assignment fire immediately with the stored value. Everything runs
// on the single logical worker, so callbacks execute synchronously inside
// `set_value`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Listener<V> = Box<dyn FnOnce(&V)>;

struct Inner<V> {
    value: Option<V>,
    listeners: Vec<Listener<V>>,
}

pub struct Placeholder<V> {
    inner: Rc<RefCell<Inner<V>>>,
}

impl<V> Clone for Placeholder<V> {
    fn clone(&self) -> Self {
        Placeholder {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> Default for Placeholder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Placeholder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved = self.inner.borrow().value.is_some();
        write!(f, "Placeholder({})", if resolved { "resolved" } else { "pending" })
    }
}

impl<V> Placeholder<V> {
    pub fn new() -> Self {
        Placeholder {
            inner: Rc::new(RefCell::new(Inner {
                value: None,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().value.is_some()
    }
}

impl<V: Clone + 'static> Placeholder<V> {
    /// Assign the value and fire every listener. Assigning twice is a
    /// contract violation and panics.
    pub fn set_value(&self, value: V) {
        let listeners = {
            let mut inner = self.inner.borrow_mut();
            assert!(inner.value.is_none(), "placeholder assigned twice");
            inner.value = Some(value.clone());
            std::mem::take(&mut inner.listeners)
        };
        for listener in listeners {
            listener(&value);
        }
    }

    /// Clone of the value, if assigned.
    pub fn value(&self) -> Option<V> {
        self.inner.borrow().value.clone()
    }

    /// Observe the value. Fires immediately when already resolved.
    pub fn on_value<F: FnOnce(&V) + 'static>(&self, listener: F) {
        let resolved = self.inner.borrow().value.clone();
        match resolved {
            Some(value) => listener(&value),
            None => self.inner.borrow_mut().listeners.push(Box::new(listener)),
        }
    }
}
