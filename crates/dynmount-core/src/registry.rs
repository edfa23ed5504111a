//! Named mount-point registry.
//!
//! Each mount-point name owns a [`MountCell`] holding the currently active
//! handle, if any. Cells are created on first reference to a name and kept
//! until [`MountPointRegistry::reset`]; unregistering only clears the value.
//!
//! Registration is governed by [`RegistryConfig`]:
//!
//! | active handle | `allow_override` | override requested | outcome |
//! |---------------|------------------|--------------------|---------|
//! | no            | any              | any                | stored |
//! | yes           | false            | any                | error if `throw_on_override_violation`, else warn + `false` |
//! | yes           | true             | false              | warn + `false` |
//! | yes           | true             | true               | replaced, subscribers notified |

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::cell::{CellSubscription, MountCell};
use crate::config::RegistryConfig;
use crate::error::{MountError, Result};
use crate::renderer::Renderer;

/// Registry of mount points for one application scope.
pub struct MountPointRegistry<R: Renderer> {
    renderer: Arc<R>,
    allow_override: AtomicBool,
    throw_on_override_violation: AtomicBool,
    cells: Mutex<HashMap<String, MountCell<R::Handle>>>,
}

impl<R: Renderer> MountPointRegistry<R> {
    /// Create an empty registry with the default policy.
    pub fn new(renderer: Arc<R>) -> Self {
        Self::with_config(renderer, RegistryConfig::default())
    }

    /// Create an empty registry with a custom policy.
    pub fn with_config(renderer: Arc<R>, config: RegistryConfig) -> Self {
        Self {
            renderer,
            allow_override: AtomicBool::new(config.allow_override),
            throw_on_override_violation: AtomicBool::new(config.throw_on_override_violation),
            cells: Mutex::new(HashMap::new()),
        }
    }

    pub fn renderer(&self) -> &Arc<R> {
        &self.renderer
    }

    /// Current registration policy.
    pub fn config(&self) -> RegistryConfig {
        RegistryConfig {
            allow_override: self.allow_override.load(Ordering::SeqCst),
            throw_on_override_violation: self.throw_on_override_violation.load(Ordering::SeqCst),
        }
    }

    /// Only affects registrations made after the call.
    pub fn set_allow_override(&self, allow: bool) {
        self.allow_override.store(allow, Ordering::SeqCst);
    }

    /// Only affects registrations made after the call.
    pub fn set_throw_on_override_violation(&self, throw: bool) {
        self.throw_on_override_violation
            .store(throw, Ordering::SeqCst);
    }

    fn lock_cells(&self) -> MutexGuard<'_, HashMap<String, MountCell<R::Handle>>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try to register a handle under `name`.
    ///
    /// Returns `Ok(false)` when the policy rejects the registration without
    /// making it fatal. See the module docs for the full table.
    pub fn register(&self, name: &str, handle: R::Handle, override_requested: bool) -> Result<bool> {
        let mut cells = self.lock_cells();
        let cell = cells.entry(name.to_string()).or_default();

        if cell.is_set() {
            let config = self.config();

            if !config.allow_override && config.throw_on_override_violation {
                return Err(MountError::DuplicateMountName {
                    name: name.to_string(),
                });
            }

            if !config.allow_override || !override_requested {
                warn!(
                    "{} is already a registered mount point, please unregister it first",
                    name
                );
                return Ok(false);
            }

            debug!("Overriding mount point {}", name);
        }

        cell.set(Some(handle));
        debug!("Registered mount point {}", name);
        Ok(true)
    }

    /// Clear the handle for `name`. The cell itself is kept.
    ///
    /// Returns false if nothing was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let cells = self.lock_cells();
        match cells.get(name) {
            Some(cell) if cell.is_set() => {
                cell.set(None);
                debug!("Unregistered mount point {}", name);
                true
            }
            _ => false,
        }
    }

    /// Check if `name` has an active handle.
    pub fn contains(&self, name: &str) -> bool {
        self.lock_cells()
            .get(name)
            .map(MountCell::is_set)
            .unwrap_or(false)
    }

    /// Cell for `name`, created empty on first use.
    pub fn cell(&self, name: &str) -> MountCell<R::Handle> {
        self.lock_cells()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Snapshot of the active handle for `name`.
    pub fn handle(&self, name: &str) -> Option<R::Handle> {
        self.lock_cells().get(name).and_then(MountCell::get)
    }

    /// Names that currently have an active handle, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock_cells()
            .iter()
            .filter(|(_, cell)| cell.is_set())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Stream of present handles for `name`: the current one first, if
    /// any, then every later registration.
    pub fn subscribe_to_handle(&self, name: &str) -> HandleStream<R::Handle> {
        HandleStream {
            inner: self.cell(name).subscribe(),
        }
    }

    /// Clear whatever is rendered at the active handle for `name`.
    ///
    /// Returns false if nothing is registered. Does not unregister.
    pub fn clear_mount_point(&self, name: &str) -> bool {
        let Some(handle) = self.handle(name) else {
            return false;
        };
        self.renderer.clear(&handle);
        debug!("Cleared mount point {}", name);
        true
    }

    /// Drop every cell. Pending subscriptions end once drained.
    pub fn reset(&self) {
        let cells = std::mem::take(&mut *self.lock_cells());
        for cell in cells.values() {
            cell.close();
        }
        info!("Mount point registry reset ({} cells dropped)", cells.len());
    }
}

/// Present handles of one mount point, absent values skipped.
///
/// Ends only when the registry is reset.
#[derive(Debug)]
pub struct HandleStream<H> {
    inner: CellSubscription<H>,
}

impl<H> HandleStream<H> {
    /// Wait for the next present handle.
    pub async fn next_handle(&mut self) -> Option<H> {
        self.next().await
    }

    /// Release the subscription explicitly.
    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}

impl<H> Stream for HandleStream<H> {
    type Item = H;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<H>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Some(handle)) => return Poll::Ready(Some(handle)),
                Some(None) => continue,
                None => return Poll::Ready(None),
            }
        }
    }
}
