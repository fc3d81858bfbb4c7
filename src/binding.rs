//! Scene Bindings - The observer layer glue.
//!
//! Two bindings connect UI content to the navigation core, and neither
//! contains any transition logic:
//!
//! - [`SceneBinding`] - scoped acquisition of "I need this scene to
//!   exist": the match count rises on construction and falls on drop,
//!   paired exactly once. This is the only way observers express interest,
//!   and the only scene state they may touch.
//! - [`scene_match`] - the render-content binding: watches `is_mounted`
//!   reactively and creates/destroys the caller's content as it flips.
//!
//! # Pattern: Effect + Stop-Closure Cleanup
//!
//! `scene_match` follows the render-effect shape used throughout this
//! family of crates:
//! 1. Create one effect that reads the mount state (the dependency)
//! 2. Create/destroy content inside the effect as the state flips
//! 3. Return a boxed cleanup that stops the effect and tears down any
//!    live content

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spark_signals::effect;

use crate::root::ScenicRoot;
use crate::scene::Scene;
use crate::types::Cleanup;

// =============================================================================
// SceneBinding
// =============================================================================

/// Scoped observer reference to a scene.
///
/// Created through [`ScenicRoot::bind`]. Construction increments the
/// scene's match count (resuming a deferred navigation when the scene was
/// parked as pending); drop decrements it. Cloning re-acquires, so every
/// handle keeps its own reference.
pub struct SceneBinding {
    scene: Scene,
}

impl SceneBinding {
    pub(crate) fn new(scene: Scene) -> Self {
        scene.retain();
        Self { scene }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl Clone for SceneBinding {
    fn clone(&self) -> Self {
        Self::new(self.scene.clone())
    }
}

impl Drop for SceneBinding {
    fn drop(&mut self) {
        self.scene.release();
    }
}

// =============================================================================
// MatchOptions
// =============================================================================

/// Per-binding rendering policy for [`scene_match`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Create content immediately, before the scene ever mounts.
    pub preload: bool,
    /// Keep content alive when the scene unmounts; it is torn down only
    /// by the binding's own cleanup.
    pub sustain: bool,
}

// =============================================================================
// scene_match
// =============================================================================

/// Bind content to the scene at `path`, creating it while the scene is
/// mounted and tearing it down when it unmounts.
///
/// Holds a [`SceneBinding`] for its whole lifetime, so the scene counts
/// one observer and a deferred visit targeting it resumes. `render` runs
/// inside the scene's ambient scope: nested code may call
/// [`ScenicRoot::ambient_scene`] to resolve the enclosing scene.
///
/// # Returns
///
/// A cleanup that destroys any live content, releases the binding, and
/// stops tracking.
///
/// # Example
///
/// ```ignore
/// use scenic::{MatchOptions, ScenicRoot, scene_match};
///
/// let root = ScenicRoot::new("/");
/// let cleanup = scene_match(&root, "/settings", MatchOptions::default(), |scene| {
///     let widgets = build_settings_panel(scene);
///     Box::new(move || drop(widgets)) as Box<dyn FnOnce()>
/// });
///
/// root.visit("/settings"); // content is created
/// root.back();             // still mounted (forward entry)
/// cleanup();               // content destroyed, observer released
/// ```
pub fn scene_match<R, C>(
    root: &Rc<ScenicRoot>,
    path: &str,
    options: MatchOptions,
    render: R,
) -> Cleanup
where
    R: Fn(&Scene) -> C + 'static,
    C: Into<Cleanup>,
{
    let binding = root.bind(path);
    let scene = binding.scene().clone();
    let root: Weak<ScenicRoot> = Rc::downgrade(root);

    // Storage for the live content's cleanup.
    let active: Rc<RefCell<Option<Cleanup>>> = Rc::new(RefCell::new(None));
    let active_for_effect = active.clone();

    let stop = effect(move || {
        let mounted = options.preload || scene.is_mounted();
        let rendered = active_for_effect.borrow().is_some();
        if mounted == rendered {
            return;
        }

        if mounted {
            let Some(root) = root.upgrade() else { return };
            root.push_scene_scope(&scene);
            let cleanup = render(&scene).into();
            root.pop_scene_scope();
            *active_for_effect.borrow_mut() = Some(cleanup);
        } else if !options.sustain {
            let cleanup = active_for_effect.borrow_mut().take();
            if let Some(cleanup) = cleanup {
                cleanup();
            }
        }
    });

    // Stop tracking first, then destroy live content, then release the
    // observer reference.
    Box::new(move || {
        stop();
        let cleanup = active.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
        drop(binding);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::ScenicRoot;
    use spark_signals::flush_sync;
    use std::cell::Cell;

    #[test]
    fn test_binding_counts_one_observer() {
        let root = ScenicRoot::new("/");
        let binding = root.bind("/a");
        assert_eq!(binding.scene().matches(), 1);

        let second = root.bind("/a");
        assert_eq!(binding.scene().matches(), 2);
        assert!(binding.scene().ptr_eq(second.scene()));

        drop(second);
        assert_eq!(binding.scene().matches(), 1);
        drop(binding);
        assert_eq!(root.get("/a").matches(), 0);
    }

    #[test]
    fn test_binding_clone_reacquires() {
        let root = ScenicRoot::new("/");
        let binding = root.bind("/a");
        let clone = binding.clone();
        assert_eq!(binding.scene().matches(), 2);

        drop(binding);
        assert_eq!(clone.scene().matches(), 1);
    }

    #[test]
    fn test_match_count_stays_non_negative() {
        let root = ScenicRoot::new("/");
        let scene = {
            let bindings = vec![root.bind("/a"), root.bind("/a"), root.bind("/a")];
            let scene = bindings[0].scene().clone();
            assert_eq!(scene.matches(), 3);
            scene
        };
        assert_eq!(scene.matches(), 0);
    }

    #[test]
    fn test_scene_match_renders_on_mount() {
        let root = ScenicRoot::new("/");
        let created = Rc::new(Cell::new(0u32));
        let destroyed = Rc::new(Cell::new(0u32));

        let created_clone = created.clone();
        let destroyed_clone = destroyed.clone();
        let cleanup = scene_match(&root, "/a", MatchOptions::default(), move |_scene| {
            created_clone.set(created_clone.get() + 1);
            let destroyed_inner = destroyed_clone.clone();
            Box::new(move || destroyed_inner.set(destroyed_inner.get() + 1)) as Cleanup
        });
        flush_sync();
        assert_eq!(created.get(), 0);

        root.visit("/a");
        flush_sync();
        assert_eq!(created.get(), 1);
        assert_eq!(destroyed.get(), 0);

        // Going back keeps the forward entry mounted; content stays.
        root.back();
        flush_sync();
        assert_eq!(destroyed.get(), 0);

        // Branching away truncates and unmounts it; content goes.
        let _other = root.bind("/b");
        root.visit("/b");
        flush_sync();
        assert_eq!(destroyed.get(), 1);

        cleanup();
        assert_eq!(created.get(), 1);
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn test_scene_match_preload_renders_immediately() {
        let root = ScenicRoot::new("/");
        let created = Rc::new(Cell::new(0u32));

        let created_clone = created.clone();
        let options = MatchOptions {
            preload: true,
            ..Default::default()
        };
        let _cleanup = scene_match(&root, "/a", options, move |_| {
            created_clone.set(created_clone.get() + 1);
            Box::new(|| {}) as Cleanup
        });
        flush_sync();
        assert_eq!(created.get(), 1);
    }

    #[test]
    fn test_scene_match_sustain_keeps_content_when_hidden() {
        let root = ScenicRoot::new("/");
        let destroyed = Rc::new(Cell::new(0u32));

        let destroyed_clone = destroyed.clone();
        let options = MatchOptions {
            sustain: true,
            ..Default::default()
        };
        let cleanup = scene_match(&root, "/a", options, move |_| {
            let destroyed_inner = destroyed_clone.clone();
            Box::new(move || destroyed_inner.set(destroyed_inner.get() + 1)) as Cleanup
        });

        root.visit("/a");
        flush_sync(); // content is live

        let _other = root.bind("/b");
        root.visit("/b");
        root.get("/a").unmount().unwrap();
        flush_sync();
        assert_eq!(destroyed.get(), 0);

        cleanup();
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn test_scene_match_resumes_deferred_navigation() {
        let root = ScenicRoot::new("/");
        root.visit("/a");
        assert_eq!(root.path(), "/");

        let _cleanup = scene_match(&root, "/a", MatchOptions::default(), |_| {
            Box::new(|| {}) as Cleanup
        });
        assert_eq!(root.path(), "/a");
    }

    #[test]
    fn test_scene_match_provides_ambient_scope() {
        let root = ScenicRoot::new("/");
        let seen: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

        let seen_clone = seen.clone();
        let root_for_render = root.clone();
        let _cleanup = scene_match(&root, "/a", MatchOptions::default(), move |_| {
            let ambient = root_for_render.ambient_scene().unwrap();
            *seen_clone.borrow_mut() = Some(ambient.path().to_string());
            Box::new(|| {}) as Cleanup
        });

        root.visit("/a");
        flush_sync();
        assert_eq!(seen.borrow().as_deref(), Some("/a"));
        // The scope unwinds once content creation returns.
        assert!(root.ambient_scene().is_err());
    }
}
