//! # scenic
//!
//! Reactive scene navigation for declarative UI trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! A [`ScenicRoot`] tracks which scene (a navigable location keyed by an
//! opaque path string) currently holds focus, keeps a back/forward
//! history, and sequences blur-then-focus handoffs so exit effects finish
//! before the next scene is announced:
//!
//! ```text
//! visit(path) → guard → resolve/defer → truncate → advance
//!             → will_blur (suspends on held guards)
//!             → race check → commit (path flips) → did_blur/did_focus → clean
//! ```
//!
//! Scene state (`matches`, `is_mounted`, `is_focused`, enter/leave flags)
//! lives in signals; bindings observe it reactively and mount/unmount UI
//! content accordingly. Everything runs on one logical thread; concurrent
//! navigation requests interleave at the single blur suspension point and
//! resolve last-writer-wins.
//!
//! ## Example
//!
//! ```ignore
//! use scenic::{MatchOptions, ScenicRoot, scene_match};
//!
//! let root = ScenicRoot::new("/");
//! let _settings = scene_match(&root, "/settings", MatchOptions::default(), |scene| {
//!     build_settings_panel(scene)
//! });
//!
//! root.visit("/settings"); // blur "/", then focus "/settings"
//! root.back();             // and back again
//! ```
//!
//! ## Modules
//!
//! - [`root`] - Navigation controller, scene cache, history stack
//! - [`scene`] - Scene nodes and their notification channels
//! - [`binding`] - Observer bindings (match counting, reactive rendering)
//! - [`channel`] - Synchronous fan-out notification streams

pub mod binding;
pub mod channel;
pub mod error;
pub mod root;
pub mod scene;
pub mod transition;
pub mod types;

// Re-export commonly used items
pub use types::{Cleanup, SceneFlags, SceneId};

pub use binding::{MatchOptions, SceneBinding, scene_match};
pub use channel::Channel;
pub use error::{Result, SceneError};
pub use root::ScenicRoot;
pub use scene::{BlurEvent, FocusEvent, Scene};
pub use transition::TransitionGuard;
