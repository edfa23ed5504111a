//! Declarative mount-point marker.
//!
//! A [`MountPointHost`] ties one registration to the lifetime of a UI
//! element: attach it when the element's handle exists, and it unregisters
//! the name again when detached or dropped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MountConfig;
use crate::error::{MountError, Result};
use crate::registry::MountPointRegistry;
use crate::renderer::Renderer;

/// Options read from the host's declaration site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostOptions {
    pub host_name: String,
    /// Ask to replace an existing registration. Only honored when the
    /// registry allows overrides.
    pub override_host: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            host_name: MountConfig::DEFAULT_MOUNT_NAME.to_string(),
            override_host: false,
        }
    }
}

impl HostOptions {
    pub fn named(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            ..Self::default()
        }
    }

    pub fn with_override(mut self, override_host: bool) -> Self {
        self.override_host = override_host;
        self
    }

    /// Reject names no load could ever target.
    pub fn validate(&self) -> Result<()> {
        if self.host_name.trim().is_empty() {
            return Err(MountError::Config {
                message: "host name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Registers a handle under a name for as long as it stays attached.
pub struct MountPointHost<R: Renderer> {
    registry: Arc<MountPointRegistry<R>>,
    options: HostOptions,
    attached: bool,
    registered: bool,
}

impl<R: Renderer> MountPointHost<R> {
    pub fn new(registry: Arc<MountPointRegistry<R>>, options: HostOptions) -> Self {
        Self {
            registry,
            options,
            attached: false,
            registered: false,
        }
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    /// Register `handle` under the host name.
    ///
    /// Returns whether the registry accepted it. A non-fatal rejection
    /// still leaves the host attached, so detaching it later unregisters
    /// the name regardless of who owns it. A fatal rejection leaves the
    /// host detached.
    pub fn attach(&mut self, handle: R::Handle) -> Result<bool> {
        self.options.validate()?;
        let registered =
            self.registry
                .register(&self.options.host_name, handle, self.options.override_host)?;
        self.attached = true;
        self.registered = registered;
        Ok(registered)
    }

    /// Unregister the host name. Returns false if the host was not attached.
    pub fn detach(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.attached = false;
        self.registered = false;
        self.registry.unregister(&self.options.host_name);
        debug!("Host {} detached", self.options.host_name);
        true
    }

    /// Result of the last `attach`.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl<R: Renderer> Drop for MountPointHost<R> {
    fn drop(&mut self) {
        self.detach();
    }
}
