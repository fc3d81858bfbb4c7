//! Transition Gate - The protocol's single suspension point.
//!
//! A focus handoff suspends exactly once: after the outgoing scene's
//! `will_blur` notification, while observers run exit effects. Observers
//! express "I'm not done yet" by holding a [`TransitionGuard`] taken from
//! the blur event; the controller arms the gate with a continuation that
//! runs synchronously if nothing is held, otherwise the moment the last
//! guard drops.
//!
//! Everything is `Rc`/`Cell` on one logical thread: there is no
//! parallelism, only interleaved continuations, so no locks are needed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct GateInner {
    held: Cell<usize>,
    continuation: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl GateInner {
    fn release(&self) {
        let held = self.held.get();
        debug_assert!(held > 0, "transition guard released twice");
        let held = held.saturating_sub(1);
        self.held.set(held);
        if held == 0 {
            let continuation = self.continuation.borrow_mut().take();
            if let Some(continuation) = continuation {
                continuation();
            }
        }
    }
}

/// Counts outstanding guards and runs the armed continuation when the last
/// one is released.
#[derive(Clone)]
pub(crate) struct TransitionGate {
    inner: Rc<GateInner>,
}

impl TransitionGate {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(GateInner {
                held: Cell::new(0),
                continuation: RefCell::new(None),
            }),
        }
    }

    /// Take a guard that delays the continuation until dropped.
    pub(crate) fn hold(&self) -> TransitionGuard {
        self.inner.held.set(self.inner.held.get() + 1);
        TransitionGuard {
            inner: self.inner.clone(),
        }
    }

    pub(crate) fn is_held(&self) -> bool {
        self.inner.held.get() > 0
    }

    /// Arm the gate. Runs `continuation` immediately when no guard is
    /// held, otherwise stores it for the last [`TransitionGuard`] drop.
    pub(crate) fn settle(self, continuation: impl FnOnce() + 'static) {
        if self.is_held() {
            debug_assert!(
                self.inner.continuation.borrow().is_none(),
                "transition gate armed twice"
            );
            *self.inner.continuation.borrow_mut() = Some(Box::new(continuation));
        } else {
            continuation();
        }
    }
}

/// Keeps a focus handoff suspended while alive.
///
/// Taken from a blur event via [`BlurEvent::defer`](crate::BlurEvent::defer);
/// dropping the last guard for a transition resumes it. The continuation
/// runs inside that drop, on the same thread.
pub struct TransitionGuard {
    inner: Rc<GateInner>,
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        self.inner.release();
    }
}
