//! Scene - A navigable location identified by an opaque path.
//!
//! A scene can be visited multiple times, so it has no knowledge of where
//! it sits in history; the root's history stack owns ordering. A scene
//! owns its focus-state flags, its match reference count, and the four
//! notification channels of the transition protocol.
//!
//! All mutable fields live in signals, so bindings observe them reactively:
//! read `is_mounted()` (or `matches()`, `is_focused()`, ...) inside a
//! spark-signals effect and the effect re-runs on every flip.

use std::rc::{Rc, Weak};

use spark_signals::{Signal, signal};

use crate::channel::Channel;
use crate::error::{Result, SceneError};
use crate::root::ScenicRoot;
use crate::transition::{TransitionGate, TransitionGuard};
use crate::types::{SceneFlags, SceneId};

// =============================================================================
// Notification Payloads
// =============================================================================

/// Payload of the `will_focus` / `did_focus` channels.
pub struct FocusEvent {
    /// The scene losing focus. `None` when the initial scene is announced.
    pub from: Option<Scene>,
}

/// Payload of the `will_blur` channel.
///
/// The handoff suspends until every guard taken with [`BlurEvent::defer`]
/// has been dropped; with none taken it proceeds synchronously.
pub struct BlurEvent {
    /// The scene about to gain focus.
    pub to: Scene,
    pub(crate) gate: TransitionGate,
}

impl BlurEvent {
    /// Delay the focus handoff until the returned guard drops.
    ///
    /// Exit-animation observers hold this for the duration of their effect.
    pub fn defer(&self) -> TransitionGuard {
        self.gate.hold()
    }
}

// =============================================================================
// Scene
// =============================================================================

pub(crate) struct SceneInner {
    id: SceneId,
    path: String,
    root: Weak<ScenicRoot>,
    /// Clone of the root's path signal; comparing against `path` derives
    /// `is_focused` reactively without touching the root.
    root_path: Signal<String>,
    matches: Signal<u32>,
    flags: Signal<SceneFlags>,
    will_focus: Channel<FocusEvent>,
    did_focus: Channel<FocusEvent>,
    will_blur: Channel<BlurEvent>,
    did_blur: Channel<()>,
}

/// A navigable logical location. Cheap to clone; clones share identity.
#[derive(Clone)]
pub struct Scene {
    inner: Rc<SceneInner>,
}

impl Scene {
    pub(crate) fn new(
        id: SceneId,
        path: String,
        root: Weak<ScenicRoot>,
        root_path: Signal<String>,
    ) -> Self {
        // The scene for the currently focused path starts mounted; every
        // other scene mounts when it becomes the active history entry.
        let initial_flags = if root_path.get() == path {
            SceneFlags::MOUNTED
        } else {
            SceneFlags::empty()
        };
        Self {
            inner: Rc::new(SceneInner {
                id,
                path,
                root,
                root_path,
                matches: signal(0u32),
                flags: signal(initial_flags),
                will_focus: Channel::new(),
                did_focus: Channel::new(),
                will_blur: Channel::new(),
                did_blur: Channel::new(),
            }),
        }
    }

    /// Per-root monotonic identifier, for debugging only.
    pub fn id(&self) -> SceneId {
        self.inner.id
    }

    /// The path used when this scene is focused.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Whether two handles refer to the same scene instance.
    pub fn ptr_eq(&self, other: &Scene) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The root this scene belongs to.
    pub fn root(&self) -> Result<Rc<ScenicRoot>> {
        self.inner
            .root
            .upgrade()
            .ok_or_else(|| SceneError::RootDropped(self.inner.path.clone()))
    }

    // =========================================================================
    // Reactive State
    // =========================================================================

    /// Number of active observers bound to this scene (reactive read).
    pub fn matches(&self) -> u32 {
        self.inner.matches.get()
    }

    /// True while UI content should remain instantiated (reactive read).
    pub fn is_mounted(&self) -> bool {
        self.inner.flags.get().contains(SceneFlags::MOUNTED)
    }

    /// True while this scene is gaining focus in an unsettled handoff
    /// (reactive read).
    pub fn is_entering(&self) -> bool {
        self.inner.flags.get().contains(SceneFlags::ENTERING)
    }

    /// True between `will_blur` and the handoff settling (reactive read).
    pub fn is_leaving(&self) -> bool {
        self.inner.flags.get().contains(SceneFlags::LEAVING)
    }

    /// True iff this scene's path is the root's current path (derived from
    /// the root's path signal, reactive read).
    pub fn is_focused(&self) -> bool {
        self.inner.root_path.get() == self.inner.path
    }

    /// Current flag set (reactive read).
    pub fn flags(&self) -> SceneFlags {
        self.inner.flags.get()
    }

    // =========================================================================
    // Navigation Requests
    // =========================================================================

    /// Ask the root to navigate to this scene's path.
    ///
    /// No-op when already focused. The transition itself runs
    /// asynchronously through the root's handoff protocol.
    pub fn focus(&self) -> Result<()> {
        let root = self.root()?;
        root.visit(&self.inner.path);
        Ok(())
    }

    /// Return to the previous scene, if this scene is focused.
    pub fn leave(&self) -> Result<()> {
        let root = self.root()?;
        if self.is_focused() {
            root.back();
        }
        Ok(())
    }

    /// Unmount content observing this scene.
    ///
    /// When focused, the root is asked to return to the previous scene
    /// instead (content must outlive its own blur); otherwise `MOUNTED` is
    /// cleared and the scene becomes eligible for eviction on the next
    /// cleanup pass.
    pub fn unmount(&self) -> Result<()> {
        let root = self.root()?;
        if self.is_focused() {
            root.back();
        } else {
            self.remove_flags(SceneFlags::MOUNTED);
        }
        Ok(())
    }

    /// Run `f` once this scene has finished blurring.
    ///
    /// When the scene is not focused, `f` runs immediately; otherwise it is
    /// queued on the `did_blur` channel for the next completed blur.
    pub fn once_blurred(&self, f: impl FnOnce() + 'static) {
        if self.is_focused() {
            // Queued cleanup is intentionally dropped; a scene that never
            // blurs again never runs the callback.
            let _cancel = self.inner.did_blur.once(move |_| f());
        } else {
            f();
        }
    }

    // =========================================================================
    // Notification Channels
    // =========================================================================

    /// Fires at commit time, immediately before this scene gains focus.
    /// A superseded transition never fires it.
    pub fn will_focus(&self) -> &Channel<FocusEvent> {
        &self.inner.will_focus
    }

    /// Fires after this scene gained focus and the previous scene's blur
    /// settled.
    pub fn did_focus(&self) -> &Channel<FocusEvent> {
        &self.inner.did_focus
    }

    /// Fires before this scene loses focus. Guards taken from the event
    /// delay the handoff.
    pub fn will_blur(&self) -> &Channel<BlurEvent> {
        &self.inner.will_blur
    }

    /// Fires after this scene lost focus, once the replacing transition
    /// committed.
    pub fn did_blur(&self) -> &Channel<()> {
        &self.inner.did_blur
    }

    // =========================================================================
    // Crate Internals
    // =========================================================================

    /// Register one observer. Retaining the pending scene resumes a
    /// deferred navigation.
    pub(crate) fn retain(&self) {
        self.inner.matches.set(self.inner.matches.get() + 1);
        if let Some(root) = self.inner.root.upgrade() {
            root.resolve_pending(self);
        }
    }

    /// Release one observer. Releasing below zero is a programmer error.
    pub(crate) fn release(&self) {
        let matches = self.inner.matches.get();
        debug_assert!(matches > 0, "scene match count underflow");
        self.inner.matches.set(matches.saturating_sub(1));
    }

    pub(crate) fn add_flags(&self, add: SceneFlags) {
        let flags = self.inner.flags.get();
        if !flags.contains(add) {
            self.inner.flags.set(flags | add);
        }
    }

    pub(crate) fn remove_flags(&self, remove: SceneFlags) {
        let flags = self.inner.flags.get();
        if flags.intersects(remove) {
            self.inner.flags.set(flags - remove);
        }
    }

}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.inner.id)
            .field("path", &self.inner.path)
            .field("matches", &self.inner.matches.get())
            .field("flags", &self.inner.flags.get())
            .finish()
    }
}
