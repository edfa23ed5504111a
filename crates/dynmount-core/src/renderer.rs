//! Boundary to the UI-tree rendering engine.

use crate::data_init::Component;
use crate::descriptor::ComponentType;

/// Rendering primitive supplied by the host UI toolkit.
///
/// The registry and the loader only ever create instances at a handle and
/// clear a handle; everything else about the UI tree stays on the other
/// side of this trait.
pub trait Renderer: Send + Sync + 'static {
    /// Opaque reference to a live insertion point in the UI tree.
    type Handle: Clone + Send + Sync + 'static;

    /// Create an instance of `descriptor` at `handle`.
    ///
    /// Called at most once per load; failures are not retried.
    fn create<C: Component>(
        &self,
        descriptor: &ComponentType<C>,
        handle: &Self::Handle,
    ) -> anyhow::Result<C>;

    /// Remove everything rendered at `handle`.
    fn clear(&self, handle: &Self::Handle);
}
