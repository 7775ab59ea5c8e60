//! Viewport visibility capability for infinite scroll.
//!
//! The feed itself never touches a rendering tree; hosts implement
//! [`VisibilityNotifier`] with whatever viewport primitive they have
//! (an IntersectionObserver on the web, a scroll offset check in a
//! native shell) and the controller wires intersection events to the
//! next category batch load.

/// Watches a zero-size marker placed after the last rendered block.
pub trait VisibilityNotifier: Send + Sync {
    /// Start observing. `on_visible` fires every time the marker comes
    /// within `proximity_margin_px` of the viewport; it must tolerate
    /// repeated firings (the controller's loading guard makes the
    /// batch load idempotent under bursts of events).
    fn observe(&mut self, proximity_margin_px: u32, on_visible: Box<dyn Fn() + Send + Sync>);

    /// Stop observing and drop the callback. Called on teardown.
    fn disconnect(&mut self);
}
