//! In-memory renderer that keeps the UI tree as lines of text.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dynmount_core::{Component, ComponentType, Renderer};
use tracing::debug;

/// Slots keyed by path, each holding the names of the components created
/// in it.
#[derive(Debug, Default)]
pub struct TextRenderer {
    slots: Mutex<BTreeMap<String, Vec<String>>>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_slots(&self) -> MutexGuard<'_, BTreeMap<String, Vec<String>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an empty slot and return its handle.
    pub fn add_slot(&self, path: &str) -> String {
        self.lock_slots().entry(path.to_string()).or_default();
        path.to_string()
    }

    pub fn remove_slot(&self, path: &str) -> bool {
        self.lock_slots().remove(path).is_some()
    }

    /// Components rendered at `path`, oldest first.
    pub fn contents(&self, path: &str) -> Vec<String> {
        self.lock_slots().get(path).cloned().unwrap_or_default()
    }

    /// Whole tree, one slot per line.
    pub fn render(&self) -> String {
        self.lock_slots()
            .iter()
            .map(|(path, children)| format!("{} [{}]", path, children.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Renderer for TextRenderer {
    type Handle = String;

    fn create<C: Component>(
        &self,
        descriptor: &ComponentType<C>,
        handle: &String,
    ) -> anyhow::Result<C> {
        let mut slots = self.lock_slots();
        let Some(children) = slots.get_mut(handle) else {
            anyhow::bail!("slot {} is no longer in the tree", handle);
        };
        children.push(descriptor.name().to_string());
        debug!("Rendered {} into {}", descriptor.name(), handle);
        Ok(descriptor.instantiate())
    }

    fn clear(&self, handle: &String) {
        if let Some(children) = self.lock_slots().get_mut(handle) {
            children.clear();
        }
    }
}
