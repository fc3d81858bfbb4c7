//! Channel - Synchronous fan-out notification streams.
//!
//! A [`Channel`] is an explicit observer list with synchronous dispatch and
//! no buffering: late subscribers see nothing of the past. Scenes use
//! channels for their focus/blur notifications, and the root uses one for
//! its focus-changed stream.
//!
//! Subscribing returns a [`Cleanup`] closure that unregisters the handler,
//! the same shape every binding in this crate returns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::types::Cleanup;

struct Subscriber<T: 'static> {
    id: u64,
    once: bool,
    call: Rc<dyn Fn(&T)>,
}

struct ChannelInner<T: 'static> {
    subscribers: RefCell<Vec<Subscriber<T>>>,
    next_id: Cell<u64>,
}

/// A synchronous fan-out event stream.
///
/// Cloning a channel is cheap and yields a handle to the same subscriber
/// list.
pub struct Channel<T: 'static> {
    inner: Rc<ChannelInner<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Register a handler for every future emission.
    ///
    /// Returns a cleanup that unregisters the handler.
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Cleanup {
        self.register(false, Rc::new(handler))
    }

    /// Register a handler for the next emission only.
    ///
    /// The handler is unregistered before it runs. The returned cleanup
    /// cancels it if the emission never happens.
    pub fn once(&self, handler: impl FnOnce(&T) + 'static) -> Cleanup {
        let slot: RefCell<Option<Box<dyn FnOnce(&T)>>> = RefCell::new(Some(Box::new(handler)));
        self.register(
            true,
            Rc::new(move |event: &T| {
                if let Some(handler) = slot.borrow_mut().take() {
                    handler(event);
                }
            }),
        )
    }

    /// Dispatch an event to every current subscriber, in subscription order.
    ///
    /// The subscriber list is snapshotted first, so handlers may subscribe
    /// or unsubscribe (including themselves) during dispatch. Handlers
    /// added mid-dispatch see only future emissions.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<(u64, bool, Rc<dyn Fn(&T)>)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.id, s.once, s.call.clone()))
            .collect();

        for (id, once, call) in snapshot {
            if once {
                // Skip if another handler already cancelled it this pass.
                if !self.remove(id) {
                    continue;
                }
            } else if !self.contains(id) {
                continue;
            }
            call(event);
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn register(&self, once: bool, call: Rc<dyn Fn(&T)>) -> Cleanup {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push(Subscriber { id, once, call });

        let channel = self.clone();
        Box::new(move || {
            channel.remove(id);
        })
    }

    fn remove(&self, id: u64) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.inner.subscribers.borrow().iter().any(|s| s.id == id)
    }
}
