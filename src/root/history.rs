//! History Stack - Ordered record of visited scenes with a cursor.
//!
//! Browser-style semantics: committing a new visit truncates everything
//! beyond the cursor, `back()` only moves the cursor. The stack is never
//! empty because a root is constructed already focused on its initial
//! scene.

use std::cell::{Cell, RefCell};

use crate::scene::Scene;

pub(crate) struct History {
    visited: RefCell<Vec<Scene>>,
    index: Cell<usize>,
}

impl History {
    pub fn new(initial: Scene) -> Self {
        Self {
            visited: RefCell::new(vec![initial]),
            index: Cell::new(0),
        }
    }

    pub fn index(&self) -> usize {
        self.index.get()
    }

    pub fn len(&self) -> usize {
        self.visited.borrow().len()
    }

    /// Scene at `index + offset`, or `None` when out of bounds.
    pub fn relative(&self, offset: isize) -> Option<Scene> {
        let target = self.index.get() as isize + offset;
        if target < 0 {
            return None;
        }
        self.visited.borrow().get(target as usize).cloned()
    }

    /// Drop every entry beyond the cursor, push `scene`, and advance the
    /// cursor onto it. Returns the dropped scenes so the controller can
    /// unmount them.
    pub fn advance(&self, scene: Scene) -> Vec<Scene> {
        let mut visited = self.visited.borrow_mut();
        let keep = self.index.get() + 1;
        let dropped: Vec<Scene> = visited.drain(keep..).collect();
        visited.push(scene);
        self.index.set(visited.len() - 1);
        dropped
    }

    /// Move the cursor one step back. `None` at the start of history.
    pub fn step_back(&self) -> Option<Scene> {
        let index = self.index.get();
        if index == 0 {
            return None;
        }
        self.index.set(index - 1);
        Some(self.visited.borrow()[index - 1].clone())
    }

    /// Whether `scene` sits anywhere in the stack.
    #[cfg(test)]
    pub fn contains(&self, scene: &Scene) -> bool {
        self.visited.borrow().iter().any(|s| s.ptr_eq(scene))
    }
}
