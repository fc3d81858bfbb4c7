//! Navigation Root - The scene-navigation controller.
//!
//! One [`ScenicRoot`] owns the scene cache, the history stack, and the
//! transition protocol. Bindings never touch either structure directly;
//! they only adjust a scene's match count, which is safe at any time
//! (including mid-transition) because it affects eviction eligibility
//! alone, never the transition's control flow.
//!
//! # Transition protocol
//!
//! `visit(path)` and `back()` share one notify/race-check/commit path:
//!
//! 1. Guard — the target path is already current: no-op.
//! 2. Resolve — fetch-or-create the target. With no observer bound to it,
//!    park it as pending and stop; retaining it later resumes the visit.
//! 3. Truncate — drop history entries beyond the cursor, unmounting them.
//! 4. Append & advance (or step the cursor back).
//! 5. Notify outgoing — emit `will_blur` carrying a transition gate; exit
//!    effects hold guards from it for as long as they need.
//! 6. Race check — when the gate settles, a transition whose epoch is no
//!    longer current abandons its commit: the later navigation won.
//! 7. Commit — flip the path signal, then fire `did_blur` / `did_focus` /
//!    root focus notifications.
//! 8. Cleanup — sweep unreferenced, unprotected scenes from the cache.
//!
//! Everything runs on one logical thread; the gate is the only suspension
//! point, and the epoch check immediately after it resolves concurrent
//! requests as last-writer-wins.

mod history;
mod registry;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, trace};
use spark_signals::{Signal, signal};

use crate::binding::SceneBinding;
use crate::channel::Channel;
use crate::error::{Result, SceneError};
use crate::scene::{BlurEvent, FocusEvent, Scene};
use crate::transition::TransitionGate;
use crate::types::{SceneFlags, SceneId};

use history::History;
use registry::SceneCache;

pub struct ScenicRoot {
    /// Handle to our own allocation, for scene back-pointers and gate
    /// continuations.
    weak_self: Weak<ScenicRoot>,
    /// The focused scene's path. Single reactive source of truth for
    /// "what is focused"; flips only at commit points.
    path: Signal<String>,
    /// Identity mirror of `path`, updated at the same commit point.
    current: RefCell<Scene>,
    cache: SceneCache,
    history: History,
    /// At most one scene awaiting an observer before a deferred visit can
    /// complete.
    pending: RefCell<Option<Scene>>,
    /// Explicit ambient-scene stack; see [`ScenicRoot::ambient_scene`].
    scope: RefCell<Vec<Scene>>,
    /// Transition sequence counter; the race check compares against it.
    epoch: Cell<u64>,
    next_scene_id: Cell<SceneId>,
    announced: Cell<bool>,
    on_focus: Channel<Scene>,
}

impl ScenicRoot {
    /// Create a root already focused on `initial_path`.
    ///
    /// The initial scene is created mounted and placed in history at index
    /// zero without notifications, since no subscriber can exist yet and
    /// channels do not buffer. Call [`notify_initial_focus`] after wiring
    /// subscribers to replay the announcement.
    ///
    /// [`notify_initial_focus`]: ScenicRoot::notify_initial_focus
    pub fn new(initial_path: impl Into<String>) -> Rc<Self> {
        let initial_path = initial_path.into();
        Rc::new_cyclic(|weak| {
            let path = signal(initial_path.clone());
            let initial = Scene::new(1, initial_path, weak.clone(), path.clone());
            let cache = SceneCache::new();
            cache.insert(initial.clone());
            Self {
                weak_self: weak.clone(),
                path,
                current: RefCell::new(initial.clone()),
                cache,
                history: History::new(initial),
                pending: RefCell::new(None),
                scope: RefCell::new(Vec::new()),
                epoch: Cell::new(0),
                next_scene_id: Cell::new(2),
                announced: Cell::new(false),
                on_focus: Channel::new(),
            }
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// The currently focused path (reactive read).
    pub fn path(&self) -> String {
        self.path.get()
    }

    /// The currently focused scene.
    pub fn current(&self) -> Scene {
        self.current.borrow().clone()
    }

    /// Find the scene with the given path, else create one.
    ///
    /// Construction is pure and idempotent per path: a second call before
    /// eviction returns the identical instance.
    pub fn get(&self, path: &str) -> Scene {
        self.cache.get_or_insert_with(path, || {
            let id = self.next_scene_id.get();
            self.next_scene_id.set(id + 1);
            Scene::new(id, path.to_string(), self.weak_self.clone(), self.path.clone())
        })
    }

    /// Scene at `history index + offset`, or `None` when out of bounds.
    ///
    /// `relative(-1)` is "the previous scene", `relative(1)` the forward
    /// entry that the next committed visit would truncate.
    pub fn relative(&self, offset: isize) -> Option<Scene> {
        self.history.relative(offset)
    }

    /// Current position in history.
    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    /// Number of entries in history (active portion plus forward entries).
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The scene parked by a deferred visit, if any.
    pub fn pending(&self) -> Option<Scene> {
        self.pending.borrow().clone()
    }

    /// Number of scenes currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate to `path`. Fire-and-forget; the handoff may suspend on the
    /// outgoing scene's blur and is resolved last-writer-wins.
    ///
    /// Visiting the current path is a no-op. Visiting a path with no bound
    /// observer parks it as pending instead of navigating (nothing is
    /// prepared to render it) and resumes automatically the moment a
    /// binding retains that exact scene.
    pub fn visit(&self, path: &str) {
        if self.path.get() == path {
            trace!("visit(\"{path}\"): already current, ignoring");
            return;
        }

        let target = self.get(path);
        if target.matches() == 0 {
            debug!("visit(\"{path}\"): no observers yet, deferring");
            *self.pending.borrow_mut() = Some(target);
            return;
        }
        // A deferral for this exact target is resolved by this visit; one
        // for a different target stays parked (the cleanup pass protects
        // it) until its own binding arrives or a newer deferral replaces
        // it.
        let resolves_pending = self
            .pending
            .borrow()
            .as_ref()
            .is_some_and(|pending| pending.ptr_eq(&target));
        if resolves_pending {
            self.pending.borrow_mut().take();
        }

        let outgoing = self.current();
        let dropped = self.history.advance(target.clone());
        for scene in dropped {
            if !scene.ptr_eq(&target) {
                scene.remove_flags(SceneFlags::MOUNTED);
            }
        }
        target.add_flags(SceneFlags::MOUNTED);

        self.handoff(outgoing, target);
    }

    /// Return to the previous scene. Silent no-op at the start of history.
    pub fn back(&self) {
        let Some(target) = self.history.step_back() else {
            trace!("back(): at start of history, ignoring");
            return;
        };

        let outgoing = self.current();
        target.add_flags(SceneFlags::MOUNTED);
        self.handoff(outgoing, target);
    }

    /// Replay the initial focus notification exactly once.
    ///
    /// The constructor cannot announce anything (channels do not buffer),
    /// so callers that subscribe after construction use this to hear about
    /// the initial scene.
    pub fn notify_initial_focus(&self) {
        if self.announced.replace(true) {
            return;
        }
        let scene = self.current();
        scene.did_focus().emit(&FocusEvent { from: None });
        self.on_focus.emit(&scene);
    }

    /// Fires after every committed transition with the newly focused scene.
    pub fn on_focus(&self) -> &Channel<Scene> {
        &self.on_focus
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    /// Bind to the scene at `path`: scoped acquisition of one observer
    /// reference. The scene's match count drops when the binding does.
    pub fn bind(&self, path: &str) -> SceneBinding {
        SceneBinding::new(self.get(path))
    }

    // =========================================================================
    // Ambient Scene Scope
    // =========================================================================

    /// Push `scene` onto the ambient-scene stack.
    ///
    /// The binding layer wraps content creation in a push/pop pair so
    /// nested code can resolve "the enclosing scene" without a global
    /// lookup. Pops must pair with pushes.
    pub fn push_scene_scope(&self, scene: &Scene) {
        self.scope.borrow_mut().push(scene.clone());
    }

    /// Pop the ambient-scene stack. Popping an empty stack is a logged
    /// no-op.
    pub fn pop_scene_scope(&self) {
        if self.scope.borrow_mut().pop().is_none() {
            trace!("pop_scene_scope(): scope stack already empty");
        }
    }

    /// The nearest enclosing scene.
    ///
    /// Errors when called outside any scene scope: a usage error, raised
    /// synchronously.
    pub fn ambient_scene(&self) -> Result<Scene> {
        self.scope
            .borrow()
            .last()
            .cloned()
            .ok_or(SceneError::NoEnclosingScene)
    }

    // =========================================================================
    // Transition Internals
    // =========================================================================

    /// Steps 5–8 of the protocol, shared verbatim by `visit` and `back`.
    fn handoff(&self, outgoing: Scene, target: Scene) {
        let token = self.epoch.get().wrapping_add(1);
        self.epoch.set(token);

        outgoing.add_flags(SceneFlags::LEAVING);
        target.add_flags(SceneFlags::ENTERING);

        let gate = TransitionGate::new();
        outgoing.will_blur().emit(&BlurEvent {
            to: target.clone(),
            gate: gate.clone(),
        });

        // Weak capture: an armed gate held by an exit effect must not keep
        // a dropped root alive.
        let root = self.weak_self.clone();
        gate.settle(move || {
            if let Some(root) = root.upgrade() {
                root.finish_handoff(token, outgoing, target);
            }
        });
    }

    /// Race check and commit. Runs when the blur gate settles, possibly
    /// synchronously inside `handoff`, possibly much later from a guard
    /// drop.
    fn finish_handoff(&self, token: u64, outgoing: Scene, target: Scene) {
        if self.epoch.get() != token {
            debug!(
                "visit(\"{}\"): superseded while \"{}\" was blurring, dropping commit",
                target.path(),
                outgoing.path()
            );
            // Concurrent transitions share the focused scene as their
            // outgoing side, so its LEAVING flag belongs to whichever
            // transition commits; only the abandoned target's ENTERING is
            // this one's to clear.
            target.remove_flags(SceneFlags::ENTERING);
            return;
        }
        outgoing.remove_flags(SceneFlags::LEAVING);

        target.will_focus().emit(&FocusEvent {
            from: Some(outgoing.clone()),
        });
        // A will_focus handler may itself navigate; the commit belongs to
        // the newest transition.
        if self.epoch.get() != token {
            target.remove_flags(SceneFlags::ENTERING);
            return;
        }
        self.path.set(target.path().to_string());
        *self.current.borrow_mut() = target.clone();

        outgoing.did_blur().emit(&());
        target.remove_flags(SceneFlags::ENTERING);
        target.did_focus().emit(&FocusEvent {
            from: Some(outgoing),
        });
        self.on_focus.emit(&target);

        self.clean();
    }

    /// Resume a deferred visit when its target gains an observer. Called
    /// from [`Scene::retain`]; a no-op unless `scene` is the parked one.
    pub(crate) fn resolve_pending(&self, scene: &Scene) {
        let is_pending = self
            .pending
            .borrow()
            .as_ref()
            .is_some_and(|pending| pending.ptr_eq(scene));
        if !is_pending {
            return;
        }
        debug!(
            "scene \"{}\" gained an observer, resuming deferred visit",
            scene.path()
        );
        let path = scene.path().to_string();
        self.visit(&path);
    }

    /// Sweep the cache: evict every scene with no observers that is
    /// neither focused nor pending. Runs only after a committed
    /// transition.
    fn clean(&self) {
        let current = self.current();
        let pending = self.pending.borrow().clone();
        let evicted = self.cache.clean(|scene| {
            scene.matches() > 0
                || scene.ptr_eq(&current)
                || pending.as_ref().is_some_and(|p| p.ptr_eq(scene))
        });
        for path in &evicted {
            trace!("evicted unreferenced scene \"{path}\"");
        }
    }
}
