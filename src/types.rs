//! Core types shared across the crate.

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier assigned to a scene at creation.
///
/// Monotonically increasing per root, for debugging and identity only;
/// never used for ordering decisions.
pub type SceneId = u64;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by bindings.
///
/// Call this to tear down the binding and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Scene Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Scene lifecycle state as a bitfield, stored inside a signal so every
    /// flip is observable.
    ///
    /// Combine with bitwise OR: `SceneFlags::MOUNTED | SceneFlags::ENTERING`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SceneFlags: u8 {
        /// UI content for the scene should remain instantiated.
        const MOUNTED = 1 << 0;
        /// The scene is gaining focus and the handoff has not settled yet.
        const ENTERING = 1 << 1;
        /// The scene is losing focus and its blur has not settled yet.
        const LEAVING = 1 << 2;
    }
}
