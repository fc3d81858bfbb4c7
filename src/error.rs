//! Error types.
//!
//! Only usage errors surface as `Err`: navigational non-events (deferred
//! visits, `back()` at history start, re-visiting the current path) and
//! superseded transitions are logged at diagnostic level and never
//! constructed as errors.

use thiserror::Error;

/// Unified result type for the crate.
pub type Result<T> = std::result::Result<T, SceneError>;

/// Usage errors raised synchronously to the caller.
#[derive(Debug, Error)]
pub enum SceneError {
    /// An ambient-scene lookup ran outside any scene scope.
    #[error("no enclosing scene in scope")]
    NoEnclosingScene,
    /// A scene operation ran after its root was dropped.
    #[error("scene `{0}` is detached from a dropped root")]
    RootDropped(String),
}
